use crate::math::{Rect, Vec2};

use super::scene::SpriteId;

pub const DEFAULT_VIEWPORT: (u32, u32) = (1440, 900);
pub const CAMERA_ZOOM_MIN: f32 = 0.25;
pub const CAMERA_ZOOM_MAX: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollow {
    pub target: SpriteId,
    pub lerp: Vec2,
}

/// World camera. `center` is the world point shown at the middle of the
/// viewport; the visible world area is `viewport / zoom`.
#[derive(Debug, Clone)]
pub struct Camera2D {
    center: Vec2,
    zoom: f32,
    viewport: Vec2,
    bounds: Option<Rect>,
    follow: Option<CameraFollow>,
    deadzone: Option<Vec2>,
    round_pixels: bool,
    snap_on_next_update: bool,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(DEFAULT_VIEWPORT.0 as f32, DEFAULT_VIEWPORT.1 as f32),
            bounds: None,
            follow: None,
            deadzone: None,
            round_pixels: false,
            snap_on_next_update: false,
        }
    }
}

impl Camera2D {
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
        self.clamp_to_bounds();
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
        } else {
            1.0
        };
        self.clamp_to_bounds();
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.clamp_to_bounds();
    }

    /// Visible world size in pixels.
    pub fn view_size(&self) -> Vec2 {
        self.viewport * (1.0 / self.zoom)
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
        self.clamp_to_bounds();
    }

    pub fn follow(&self) -> Option<CameraFollow> {
        self.follow
    }

    pub fn start_follow(&mut self, target: SpriteId, lerp: Vec2) {
        self.follow = Some(CameraFollow { target, lerp });
        self.snap_on_next_update = true;
    }

    pub fn stop_follow(&mut self) {
        self.follow = None;
    }

    pub fn deadzone(&self) -> Option<Vec2> {
        self.deadzone
    }

    pub fn set_deadzone(&mut self, width: f32, height: f32) {
        self.deadzone = Some(Vec2::new(width.max(0.0), height.max(0.0)));
    }

    pub fn round_pixels(&self) -> bool {
        self.round_pixels
    }

    pub fn set_round_pixels(&mut self, round_pixels: bool) {
        self.round_pixels = round_pixels;
    }

    /// Top-left world position of the view.
    pub fn scroll(&self) -> Vec2 {
        let view = self.view_size();
        let scroll = Vec2::new(self.center.x - view.x * 0.5, self.center.y - view.y * 0.5);
        if self.round_pixels {
            scroll.round()
        } else {
            scroll
        }
    }

    pub fn world_view(&self) -> Rect {
        let scroll = self.scroll();
        let view = self.view_size();
        Rect::new(scroll.x, scroll.y, view.x, view.y)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.scroll()) * self.zoom
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen * (1.0 / self.zoom) + self.scroll()
    }

    /// Moves toward the followed sprite. The first update after
    /// `start_follow` snaps instead of interpolating.
    pub fn update(&mut self, target_position: Option<Vec2>) {
        let (Some(follow), Some(target)) = (self.follow, target_position) else {
            return;
        };

        if self.snap_on_next_update {
            self.snap_on_next_update = false;
            self.center = target;
            self.clamp_to_bounds();
            return;
        }

        let desired = match self.deadzone {
            Some(deadzone) => Vec2::new(
                deadzone_axis(self.center.x, target.x, deadzone.x),
                deadzone_axis(self.center.y, target.y, deadzone.y),
            ),
            None => target,
        };
        self.center = self.center.lerp(desired, follow.lerp);
        self.clamp_to_bounds();
    }

    fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let view = self.view_size();
        self.center.x = clamp_axis(self.center.x, bounds.x, bounds.w, view.x);
        self.center.y = clamp_axis(self.center.y, bounds.y, bounds.h, view.y);
    }
}

fn deadzone_axis(center: f32, target: f32, size: f32) -> f32 {
    let half = size * 0.5;
    if target < center - half {
        target + half
    } else if target > center + half {
        target - half
    } else {
        center
    }
}

fn clamp_axis(center: f32, start: f32, length: f32, view: f32) -> f32 {
    if view >= length {
        return start + length * 0.5;
    }
    center.clamp(start + view * 0.5, start + length - view * 0.5)
}
