/// Clipped RGBA drawing on a borrowed frame buffer. All coordinates are
/// screen pixels; anything outside the frame is skipped.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

/// Source pixels for `Canvas::blit`.
pub(crate) struct ImageView<'a> {
    pub rgba: &'a [u8],
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub(crate) fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if color[3] == 0 || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if color[3] == 255 {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = color[3] as u32;
        for channel in 0..3 {
            let blended = (color[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha)) / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = 255;
    }

    pub(crate) fn fill_rect(&mut self, rect: PixelRect, color: [u8; 4]) {
        let start_x = rect.x.max(0);
        let start_y = rect.y.max(0);
        let end_x = rect.x.saturating_add(rect.w).min(self.width as i32);
        let end_y = rect.y.saturating_add(rect.h).min(self.height as i32);
        for y in start_y..end_y {
            for x in start_x..end_x {
                self.put_pixel(x, y, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, rect: PixelRect, color: [u8; 4]) {
        if rect.w <= 1 || rect.h <= 1 {
            return;
        }
        self.fill_rect(PixelRect { h: 1, ..rect }, color);
        self.fill_rect(
            PixelRect {
                y: rect.y + rect.h - 1,
                h: 1,
                ..rect
            },
            color,
        );
        self.fill_rect(PixelRect { w: 1, ..rect }, color);
        self.fill_rect(
            PixelRect {
                x: rect.x + rect.w - 1,
                w: 1,
                ..rect
            },
            color,
        );
    }

    pub(crate) fn line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 4]) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let step_x = if x < to.0 { 1 } else { -1 };
        let step_y = if y < to.1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.put_pixel(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    /// Nearest-neighbour copy of `src` (a rectangle inside `image`) into
    /// `dst`, optionally mirrored horizontally and faded by `alpha`.
    pub(crate) fn blit(
        &mut self,
        image: &ImageView<'_>,
        src: PixelRect,
        dst: PixelRect,
        flip_x: bool,
        alpha: f32,
    ) {
        if dst.w <= 0 || dst.h <= 0 || src.w <= 0 || src.h <= 0 {
            return;
        }
        if image.rgba.len() < image.width as usize * image.height as usize * 4 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let draw_left = dst.x.max(0);
        let draw_top = dst.y.max(0);
        let draw_right = dst.x.saturating_add(dst.w).min(self.width as i32);
        let draw_bottom = dst.y.saturating_add(dst.h).min(self.height as i32);

        for out_y in draw_top..draw_bottom {
            let v = (out_y - dst.y) * src.h / dst.h;
            let src_y = src.y + v;
            if src_y < 0 || src_y >= image.height as i32 {
                continue;
            }
            for out_x in draw_left..draw_right {
                let mut u = (out_x - dst.x) * src.w / dst.w;
                if flip_x {
                    u = src.w - 1 - u;
                }
                let src_x = src.x + u;
                if src_x < 0 || src_x >= image.width as i32 {
                    continue;
                }
                let offset = (src_y as usize * image.width as usize + src_x as usize) * 4;
                let texel = &image.rgba[offset..offset + 4];
                let texel_alpha = (texel[3] as f32 * alpha).round() as u8;
                self.put_pixel(out_x, out_y, [texel[0], texel[1], texel[2], texel_alpha]);
            }
        }
    }
}
