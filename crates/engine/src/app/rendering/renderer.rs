use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Camera2D, SceneWorld, SpriteSheet};
use crate::arcade::BodyKind;
use crate::math::{Rect, Vec2};

use super::canvas::{Canvas, ImageView, PixelRect};
use super::font::{draw_text, text_width_px, GLYPH_HEIGHT};
use super::transform::{world_rect_to_screen, world_to_screen_px};
use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const TILE_SOLID_COLOR: [u8; 4] = [112, 83, 58, 255];
const TILE_DECOR_COLOR: [u8; 4] = [74, 112, 56, 255];
const DEBUG_DYNAMIC_BODY_COLOR: [u8; 4] = [255, 0, 255, 255];
const DEBUG_STATIC_BODY_COLOR: [u8; 4] = [0, 120, 255, 255];
const DEBUG_VELOCITY_COLOR: [u8; 4] = [0, 255, 0, 255];
const DEBUG_VELOCITY_SECONDS: f32 = 0.1;
const PARTICLE_FALLBACK_SIZE_PX: f32 = 16.0;
const HUD_PLATE_COLOR: [u8; 4] = [10, 12, 16, 150];

struct LoadedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedImage {
    fn view(&self) -> ImageView<'_> {
        ImageView {
            rgba: &self.rgba,
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel rectangle of `frame` in a grid of `sheet`-sized cells, row-major.
    fn frame_rect(&self, sheet: &SpriteSheet, frame: u32) -> Option<PixelRect> {
        let columns = self.width / sheet.frame_width;
        if columns == 0 {
            return None;
        }
        let column = frame % columns;
        let row = frame / columns;
        if (row + 1) * sheet.frame_height > self.height {
            return None;
        }
        Some(PixelRect {
            x: (column * sheet.frame_width) as i32,
            y: (row * sheet.frame_height) as i32,
            w: sheet.frame_width as i32,
            h: sheet.frame_height as i32,
        })
    }
}

/// Decoded images keyed by asset-relative path. Failed loads are cached as
/// `None` and warned about once.
pub(crate) struct ImageCache {
    asset_root: PathBuf,
    images: HashMap<String, Option<LoadedImage>>,
    warned_missing_images: HashSet<String>,
}

impl ImageCache {
    pub(crate) fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            images: HashMap::new(),
            warned_missing_images: HashSet::new(),
        }
    }

    fn get(&mut self, image_path: &str) -> Option<&LoadedImage> {
        if !self.images.contains_key(image_path) {
            let full_path = self.asset_root.join(image_path);
            let loaded = match load_image_rgba(&full_path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    warn_image_load_once(
                        &mut self.warned_missing_images,
                        image_path,
                        &full_path,
                        &reason,
                    );
                    None
                }
            };
            self.images.insert(image_path.to_string(), loaded);
        }
        self.images.get(image_path).and_then(Option::as_ref)
    }

    fn sheet_image(&mut self, sheet: Option<&SpriteSheet>) -> Option<&LoadedImage> {
        self.get(&sheet?.image_path)
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    images: ImageCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            images: ImageCache::new(asset_root),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        {
            let frame = self.pixels.frame_mut();
            let mut canvas = Canvas::new(frame, self.viewport.width, self.viewport.height);
            draw_world(&mut canvas, world, &mut self.images);
        }
        self.pixels.render()
    }
}

pub(crate) fn draw_world(canvas: &mut Canvas<'_>, world: &SceneWorld, images: &mut ImageCache) {
    canvas.clear(CLEAR_COLOR);
    let camera = world.camera();
    draw_tile_layers(canvas, world, camera, images);
    draw_sprites(canvas, world, camera, images);
    draw_particles(canvas, world, camera, images);
    if world.physics().debug_draw() {
        draw_debug_bodies(canvas, world, camera);
    }
    draw_texts(canvas, world, camera);
}

fn draw_tile_layers(
    canvas: &mut Canvas<'_>,
    world: &SceneWorld,
    camera: &Camera2D,
    images: &mut ImageCache,
) {
    let Some(tilemap) = world.tilemap() else {
        return;
    };
    let tile_size = tilemap.tile_size();
    let view = camera.world_view();
    let x_min = (view.left() / tile_size.x).floor().max(0.0) as u32;
    let y_min = (view.top() / tile_size.y).floor().max(0.0) as u32;
    let x_max = ((view.right() / tile_size.x).ceil().max(0.0) as u32).min(tilemap.width());
    let y_max = ((view.bottom() / tile_size.y).ceil().max(0.0) as u32).min(tilemap.height());

    for layer_name in world.visible_layers() {
        let Some(layer) = tilemap.tile_layer(layer_name) else {
            continue;
        };
        if !layer.visible() {
            continue;
        }
        for y in y_min..y_max {
            for x in x_min..x_max {
                let Some(gid) = layer.gid_at(x, y) else {
                    continue;
                };
                let Some((tileset, local)) = tilemap.tileset_for_gid(gid) else {
                    continue;
                };
                let world_rect = Rect::new(
                    x as f32 * tile_size.x,
                    y as f32 * tile_size.y,
                    tile_size.x,
                    tile_size.y,
                );
                let dst = world_rect_to_screen(camera, world_rect);
                let sheet = world
                    .tileset_texture(&tileset.name)
                    .and_then(|texture| world.spritesheet(texture));
                let drawn = match (sheet, images.sheet_image(sheet)) {
                    (Some(sheet), Some(image)) => image
                        .frame_rect(sheet, local)
                        .map(|src| canvas.blit(&image.view(), src, dst, false, 1.0))
                        .is_some(),
                    _ => false,
                };
                if !drawn {
                    let color = if layer.is_solid(x as i32, y as i32) {
                        TILE_SOLID_COLOR
                    } else {
                        TILE_DECOR_COLOR
                    };
                    canvas.fill_rect(dst, color);
                }
            }
        }
    }
}

fn draw_sprites(
    canvas: &mut Canvas<'_>,
    world: &SceneWorld,
    camera: &Camera2D,
    images: &mut ImageCache,
) {
    let view = camera.world_view();
    for sprite in world.sprites() {
        if !sprite.visible || !sprite.bounds().intersects(&view) {
            continue;
        }
        let dst = world_rect_to_screen(camera, sprite.bounds());
        let sheet = sprite
            .desc
            .texture
            .as_deref()
            .and_then(|texture| world.spritesheet(texture));
        let drawn = match (sheet, images.sheet_image(sheet)) {
            (Some(sheet), Some(image)) => image
                .frame_rect(sheet, sprite.desc.frame)
                .map(|src| canvas.blit(&image.view(), src, dst, sprite.flip_x, 1.0))
                .is_some(),
            _ => false,
        };
        if !drawn {
            canvas.fill_rect(dst, sprite.desc.fallback_color);
        }
    }
}

fn draw_particles(
    canvas: &mut Canvas<'_>,
    world: &SceneWorld,
    camera: &Camera2D,
    images: &mut ImageCache,
) {
    for emitter in world.emitters() {
        let config = emitter.config();
        let sheet = world.spritesheet(&config.texture);
        let base_size = sheet
            .map(|sheet| Vec2::new(sheet.frame_width as f32, sheet.frame_height as f32))
            .unwrap_or(Vec2::new(PARTICLE_FALLBACK_SIZE_PX, PARTICLE_FALLBACK_SIZE_PX));

        for particle in emitter.particles() {
            let progress = emitter.progress(particle);
            let scale = config.scale.at(progress);
            let alpha = config.alpha.at(progress);
            if scale <= 0.0 || alpha <= 0.0 {
                continue;
            }
            let mut dst = world_rect_to_screen(
                camera,
                Rect::from_center(particle.position, base_size * scale),
            );
            dst.w = dst.w.max(1);
            dst.h = dst.h.max(1);

            let drawn = match (sheet, images.sheet_image(sheet)) {
                (Some(sheet), Some(image)) => image
                    .frame_rect(sheet, particle.frame)
                    .map(|src| canvas.blit(&image.view(), src, dst, false, alpha))
                    .is_some(),
                _ => false,
            };
            if !drawn {
                let mut color = config.tint;
                color[3] = (color[3] as f32 * alpha).round() as u8;
                canvas.fill_rect(dst, color);
            }
        }
    }
}

fn draw_debug_bodies(canvas: &mut Canvas<'_>, world: &SceneWorld, camera: &Camera2D) {
    for sprite in world.sprites() {
        let Some(body) = sprite.body.as_ref() else {
            continue;
        };
        let rect = world_rect_to_screen(camera, body.bounds_at(sprite.position));
        let color = match body.kind {
            BodyKind::Dynamic => DEBUG_DYNAMIC_BODY_COLOR,
            BodyKind::Static => DEBUG_STATIC_BODY_COLOR,
        };
        canvas.outline_rect(rect, color);

        if body.kind == BodyKind::Dynamic {
            let from = world_to_screen_px(camera, sprite.position);
            let to = world_to_screen_px(
                camera,
                sprite.position + body.velocity * DEBUG_VELOCITY_SECONDS,
            );
            canvas.line(from, to, DEBUG_VELOCITY_COLOR);
        }
    }
}

fn draw_texts(canvas: &mut Canvas<'_>, world: &SceneWorld, camera: &Camera2D) {
    for text in world.texts() {
        let scale = text.scale.max(1) as i32;
        let (x, y) = if text.scroll_factor == 0.0 {
            (text.position.x.round() as i32, text.position.y.round() as i32)
        } else {
            world_to_screen_px(camera, text.position)
        };
        if text.scroll_factor == 0.0 && !text.content.is_empty() {
            canvas.fill_rect(
                PixelRect {
                    x: x - scale,
                    y: y - scale,
                    w: text_width_px(&text.content, scale) + scale * 2,
                    h: GLYPH_HEIGHT * scale + scale * 2,
                },
                HUD_PLATE_COLOR,
            );
        }
        draw_text(canvas, x, y, &text.content, scale, text.color);
    }
}

fn load_image_rgba(path: &Path) -> Result<LoadedImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_image_load_once(
    warned_paths: &mut HashSet<String>,
    image_path: &str,
    resolved_path: &Path,
    reason: &str,
) {
    if !warned_paths.insert(image_path.to_string()) {
        return;
    }
    warn!(
        image = image_path,
        path = %resolved_path.display(),
        reason = reason,
        "renderer_image_load_failed_using_fallback"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SpriteDesc;
    use crate::arcade::ArcadeBody;
    use tempfile::TempDir;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * WIDTH + x) * 4) as usize;
        [frame[offset], frame[offset + 1], frame[offset + 2], frame[offset + 3]]
    }

    fn small_world() -> SceneWorld {
        let mut world = SceneWorld::default();
        world.camera_mut().set_viewport(WIDTH, HEIGHT);
        world.camera_mut().set_center(Vec2::new(32.0, 24.0));
        world
    }

    fn render(world: &SceneWorld, images: &mut ImageCache) -> Vec<u8> {
        let mut frame = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        let mut canvas = Canvas::new(&mut frame, WIDTH, HEIGHT);
        draw_world(&mut canvas, world, images);
        frame
    }

    #[test]
    fn missing_texture_draws_fallback_color_and_warns_once() {
        let temp = TempDir::new().expect("temp dir");
        let mut images = ImageCache::new(temp.path().to_path_buf());
        let mut world = small_world();
        world
            .add_spritesheet("platformer_characters", "characters_packed.png", 24, 24)
            .expect("sheet");
        world.spawn(
            Vec2::new(20.0, 20.0),
            SpriteDesc::placeholder("player", Vec2::new(8.0, 8.0))
                .with_texture("platformer_characters", 0)
                .with_fallback_color([200, 40, 40, 255]),
        );
        world.apply_pending();

        let frame = render(&world, &mut images);
        assert_eq!(pixel(&frame, 20, 20), [200, 40, 40, 255]);
        assert_eq!(pixel(&frame, 2, 2), CLEAR_COLOR);

        render(&world, &mut images);
        assert_eq!(images.warned_missing_images.len(), 1);
    }

    #[test]
    fn spritesheet_frame_is_blitted_when_image_exists() {
        let temp = TempDir::new().expect("temp dir");
        let mut sheet = image::RgbaImage::new(4, 2);
        for x in 0..2 {
            for y in 0..2 {
                sheet.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                sheet.put_pixel(x + 2, y, image::Rgba([0, 0, 255, 255]));
            }
        }
        sheet
            .save(temp.path().join("sheet.png"))
            .expect("write png");

        let mut images = ImageCache::new(temp.path().to_path_buf());
        let mut world = small_world();
        world.add_spritesheet("sheet", "sheet.png", 2, 2).expect("sheet");
        world.spawn(
            Vec2::new(10.0, 10.0),
            SpriteDesc::placeholder("coin", Vec2::new(4.0, 4.0)).with_texture("sheet", 1),
        );
        world.apply_pending();

        let frame = render(&world, &mut images);
        assert_eq!(pixel(&frame, 9, 9), [0, 0, 255, 255]);
        assert!(images.warned_missing_images.is_empty());
    }

    #[test]
    fn screen_space_text_ignores_camera_scroll() {
        let temp = TempDir::new().expect("temp dir");
        let mut images = ImageCache::new(temp.path().to_path_buf());
        let mut world = small_world();
        world.camera_mut().set_center(Vec2::new(500.0, 500.0));
        let hud = world.add_text(Vec2::new(0.0, 0.0), "8");
        if let Some(text) = world.text_mut(hud) {
            text.scroll_factor = 0.0;
            text.scale = 2;
        }

        let frame = render(&world, &mut images);
        assert_eq!(pixel(&frame, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn debug_outlines_only_when_enabled() {
        let temp = TempDir::new().expect("temp dir");
        let mut images = ImageCache::new(temp.path().to_path_buf());
        let mut world = small_world();
        let mut desc = SpriteDesc::placeholder("marker", Vec2::new(10.0, 10.0));
        desc.fallback_color = [0, 0, 0, 0];
        world.spawn_with_body(
            Vec2::new(30.0, 30.0),
            desc,
            ArcadeBody::fixed(Vec2::new(10.0, 10.0)),
        );
        world.apply_pending();

        let frame = render(&world, &mut images);
        assert_eq!(pixel(&frame, 25, 25), CLEAR_COLOR);

        world.physics_mut().set_debug_draw(true);
        let frame = render(&world, &mut images);
        assert_eq!(pixel(&frame, 25, 25), DEBUG_STATIC_BODY_COLOR);
    }
}
