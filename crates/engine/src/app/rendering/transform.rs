use crate::app::Camera2D;
use crate::math::{Rect, Vec2};

use super::canvas::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub fn world_to_screen_px(camera: &Camera2D, world: Vec2) -> (i32, i32) {
    let screen = camera.world_to_screen(world);
    (screen.x.round() as i32, screen.y.round() as i32)
}

/// Snaps both corners so neighbouring tiles share edges without gaps.
pub(crate) fn world_rect_to_screen(camera: &Camera2D, rect: Rect) -> PixelRect {
    let (left, top) = world_to_screen_px(camera, Vec2::new(rect.left(), rect.top()));
    let (right, bottom) = world_to_screen_px(camera, Vec2::new(rect.right(), rect.bottom()));
    PixelRect {
        x: left,
        y: top,
        w: right - left,
        h: bottom - top,
    }
}
