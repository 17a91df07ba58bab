// Copyright (c) 2026 glowveil contributors

use crate::canvas::Canvas;
use crate::frame::{Cell, Frame};
use crate::palette::Palette;
use crate::runtime::GlyphMode;
use crate::viewport::{SUB_X, SUB_Y};

/// Braille dot bit for sub-cell (x, y):
/// (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64, (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
const DOTS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

const BRAILLE_BASE: u32 = 0x2800;

/// Minimum sub-cell intensity for a braille dot to light up.
const DOT_ON: f32 = 0.08;

/// Cells at or above this intensity also get the bold attribute.
const BOLD_AT: f32 = 0.85;

const SHADE_RAMP: [char; 5] = [' ', '\u{2591}', '\u{2592}', '\u{2593}', '\u{2588}'];

fn braille_char(bits: u8) -> char {
    char::from_u32(BRAILLE_BASE + bits as u32).unwrap_or(' ')
}

/// Compose the intensity buffer into terminal cells. Dimensions must
/// agree (canvas = frame size times the sub-cell density); mismatched
/// frames are left untouched, which only happens transiently during a
/// resize before the caller rebuilds both.
pub fn compose(canvas: &Canvas, frame: &mut Frame, palette: &Palette, mode: GlyphMode) {
    let cols = frame.width as usize;
    let rows = frame.height as usize;
    if canvas.width() != cols * SUB_X as usize || canvas.height() != rows * SUB_Y as usize {
        return;
    }

    for row in 0..rows {
        for col in 0..cols {
            let cell = compose_cell(canvas, palette, mode, col, row);
            frame.set(col as u16, row as u16, cell);
        }
    }
}

fn compose_cell(canvas: &Canvas, palette: &Palette, mode: GlyphMode, col: usize, row: usize) -> Cell {
    let x0 = col * SUB_X as usize;
    let y0 = row * SUB_Y as usize;

    let mut bits: u8 = 0;
    let mut peak = 0.0f32;
    let mut sum = 0.0f32;
    for sy in 0..SUB_Y as usize {
        for sx in 0..SUB_X as usize {
            let v = canvas.at(x0 + sx, y0 + sy);
            sum += v;
            if v > peak {
                peak = v;
            }
            if v >= DOT_ON {
                bits |= DOTS[sx][sy];
            }
        }
    }

    match mode {
        GlyphMode::Braille => {
            if bits == 0 {
                return Cell::blank_with_bg(palette.bg);
            }
            Cell {
                ch: braille_char(bits),
                fg: palette.shade(peak),
                bg: palette.bg,
                bold: peak >= BOLD_AT,
            }
        }
        GlyphMode::Blocks => {
            let avg = sum / (SUB_X as f32 * SUB_Y as f32);
            let level = (avg.clamp(0.0, 1.0) * (SHADE_RAMP.len() - 1) as f32).round() as usize;
            if level == 0 {
                return Cell::blank_with_bg(palette.bg);
            }
            Cell {
                ch: SHADE_RAMP[level.min(SHADE_RAMP.len() - 1)],
                fg: palette.shade(peak),
                bg: palette.bg,
                bold: peak >= BOLD_AT,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{build_palette, Background, Theme};
    use crate::runtime::ColorMode;

    fn test_palette() -> Palette {
        build_palette(Theme::Cyan, ColorMode::TrueColor, Background::Black)
    }

    #[test]
    fn empty_canvas_composes_to_blank_cells() {
        let canvas = Canvas::new(4, 8);
        let palette = test_palette();
        let mut frame = Frame::new(2, 2, palette.bg);
        compose(&canvas, &mut frame, &palette, GlyphMode::Braille);
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(frame.get(col, row).unwrap().ch, ' ');
            }
        }
    }

    #[test]
    fn lit_subcell_sets_matching_braille_dot() {
        let mut canvas = Canvas::new(2, 4);
        let palette = test_palette();
        // Upper-left sub-cell only, with a tight footprint.
        canvas.splat(0.5, 0.5, 0.7, 1.0);
        let mut frame = Frame::new(1, 1, palette.bg);
        compose(&canvas, &mut frame, &palette, GlyphMode::Braille);
        let ch = frame.get(0, 0).unwrap().ch;
        assert!(('\u{2800}'..='\u{28FF}').contains(&ch));
        let bits = ch as u32 - BRAILLE_BASE;
        assert_ne!(bits & 0x01, 0);
    }

    #[test]
    fn blocks_mode_uses_shade_ramp() {
        let mut canvas = Canvas::new(2, 4);
        let palette = test_palette();
        for y in 0..4 {
            for x in 0..2 {
                canvas.splat(x as f32 + 0.5, y as f32 + 0.5, 0.7, 1.2);
            }
        }
        let mut frame = Frame::new(1, 1, palette.bg);
        compose(&canvas, &mut frame, &palette, GlyphMode::Blocks);
        let ch = frame.get(0, 0).unwrap().ch;
        assert!(SHADE_RAMP[1..].contains(&ch));
    }

    #[test]
    fn mismatched_dimensions_leave_frame_untouched() {
        let canvas = Canvas::new(10, 10);
        let palette = test_palette();
        let mut frame = Frame::new(2, 2, palette.bg);
        frame.clear_dirty();
        compose(&canvas, &mut frame, &palette, GlyphMode::Braille);
        assert!(frame.dirty_indices().is_empty() && !frame.is_dirty_all());
    }
}
