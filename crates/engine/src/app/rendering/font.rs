use super::canvas::{Canvas, PixelRect};

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;

/// 3x5 bitmap glyphs, one row per byte with the leftmost column in bit 2.
/// Lower-case letters draw with their upper-case glyph.
const GLYPHS: &[(char, [u8; 5])] = &[
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b111, 0b100, 0b100, 0b100, 0b111]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b111, 0b100, 0b101, 0b101, 0b111]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b111, 0b001, 0b001, 0b101, 0b111]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b101, 0b111, 0b111, 0b111, 0b101]),
    ('O', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b111, 0b101, 0b101, 0b111, 0b001]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('?', [0b111, 0b001, 0b011, 0b000, 0b010]),
];

pub(crate) fn glyph_rows(ch: char) -> Option<[u8; 5]> {
    let upper = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(glyph, _)| *glyph == upper)
        .map(|(_, rows)| *rows)
}

pub(crate) fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale.max(1)
}

pub(crate) fn text_width_px(text: &str, scale: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        return 0;
    }
    count * glyph_advance(scale) - scale.max(1)
}

/// Draws `text` with its top-left corner at (`x`, `y`). Unknown characters
/// advance like a space.
pub(crate) fn draw_text(canvas: &mut Canvas<'_>, x: i32, y: i32, text: &str, scale: i32, color: [u8; 4]) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        if let Some(rows) = glyph_rows(ch) {
            for (row_index, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    canvas.fill_rect(
                        PixelRect {
                            x: pen_x + col * scale,
                            y: y + row_index as i32 * scale,
                            w: scale,
                            h: scale,
                        },
                        color,
                    );
                }
            }
        }
        pen_x += glyph_advance(scale);
    }
}
