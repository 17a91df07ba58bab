// Copyright (c) 2026 glowveil contributors

use crossterm::style::Color;

use crate::runtime::ColorMode;

/// Number of gradient steps in an intensity ramp.
const RAMP_STEPS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Cyan,
    Sky,
    Aurora,
    Violet,
    Ember,
    Mint,
    Gold,
    Ice,
    Neon,
    Gray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Background {
    Black,
    Default,
    Transparent,
}

#[derive(Clone, Debug)]
pub struct Palette {
    pub ramp: Vec<Color>,
    pub bg: Option<Color>,
    mono: bool,
}

impl Palette {
    /// Map an intensity in [0, 1] to a ramp color. Mono mode leaves the
    /// foreground to the terminal default; glyph density carries the
    /// brightness instead.
    pub fn shade(&self, intensity: f32) -> Option<Color> {
        if self.mono || self.ramp.is_empty() {
            return None;
        }
        let t = intensity.clamp(0.0, 1.0);
        let idx = (t * (self.ramp.len() - 1) as f32).round() as usize;
        self.ramp.get(idx).copied()
    }
}

/// Gradient stops per theme, dim end first. The last stop sits near
/// white so saturated deposits (sparkle peaks, stroke crossings) read
/// as a highlight, not just a brighter hue.
fn theme_stops(theme: Theme) -> &'static [(u8, u8, u8)] {
    match theme {
        Theme::Cyan => &[(6, 36, 46), (0, 112, 134), (0, 217, 255), (210, 250, 255)],
        Theme::Sky => &[(10, 24, 48), (44, 88, 160), (88, 160, 255), (220, 236, 255)],
        Theme::Aurora => &[(8, 28, 26), (16, 120, 96), (64, 224, 160), (200, 255, 230)],
        Theme::Violet => &[(26, 10, 42), (96, 48, 168), (170, 110, 255), (238, 224, 255)],
        Theme::Ember => &[(38, 12, 6), (150, 52, 12), (255, 140, 48), (255, 236, 200)],
        Theme::Mint => &[(8, 30, 22), (30, 120, 84), (110, 230, 170), (226, 255, 240)],
        Theme::Gold => &[(40, 28, 4), (150, 110, 18), (255, 206, 64), (255, 246, 214)],
        Theme::Ice => &[(16, 24, 40), (80, 120, 170), (170, 210, 250), (240, 250, 255)],
        Theme::Neon => &[(30, 4, 36), (150, 20, 160), (255, 64, 220), (255, 220, 250)],
        Theme::Gray => &[(28, 28, 28), (96, 96, 96), (180, 180, 180), (250, 250, 250)],
    }
}

pub fn build_palette(theme: Theme, mode: ColorMode, bg: Background) -> Palette {
    let stops = theme_stops(theme);
    let rgb = gradient_from_stops(stops, RAMP_STEPS);
    Palette {
        ramp: colors_from_rgb(mode, &rgb),
        bg: match bg {
            Background::Black => Some(Color::Black),
            Background::Default | Background::Transparent => None,
        },
        mono: mode == ColorMode::Mono,
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

fn gradient_from_stops(stops: &[(u8, u8, u8)], steps: usize) -> Vec<(u8, u8, u8)> {
    if steps == 0 || stops.is_empty() {
        return Vec::new();
    }
    if stops.len() == 1 || steps == 1 {
        return vec![stops[0]; steps];
    }

    let segs = stops.len() - 1;
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = i as f32 / (steps - 1) as f32;
        let pos = t * segs as f32;
        let seg = (pos.floor() as usize).min(segs - 1);
        let frac = pos - seg as f32;
        let (r0, g0, b0) = stops[seg];
        let (r1, g1, b1) = stops[seg + 1];
        out.push((
            lerp_u8(r0, r1, frac),
            lerp_u8(g0, g1, frac),
            lerp_u8(b0, b1, frac),
        ));
    }
    out
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = r0 as i32 - r1 as i32;
    let dg = g0 as i32 - g1 as i32;
    let db = b0 as i32 - b1 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn colors_from_rgb(mode: ColorMode, list: &[(u8, u8, u8)]) -> Vec<Color> {
    match mode {
        ColorMode::Mono => vec![Color::White],
        ColorMode::TrueColor => list
            .iter()
            .map(|&(r, g, b)| Color::Rgb { r, g, b })
            .collect(),
        ColorMode::Color256 => list
            .iter()
            .map(|&(r, g, b)| Color::AnsiValue(rgb_to_ansi256(r, g, b)))
            .collect(),
        ColorMode::Color16 => list
            .iter()
            .map(|&(r, g, b)| rgb_to_color16(r, g, b))
            .collect(),
    }
}

pub fn parse_theme(s: &str) -> Result<Theme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "cyan" => Ok(Theme::Cyan),
        "sky" | "skyblue" | "sky-blue" => Ok(Theme::Sky),
        "aurora" => Ok(Theme::Aurora),
        "violet" | "purple" => Ok(Theme::Violet),
        "ember" | "fire" => Ok(Theme::Ember),
        "mint" => Ok(Theme::Mint),
        "gold" => Ok(Theme::Gold),
        "ice" | "snow" => Ok(Theme::Ice),
        "neon" | "synthwave" => Ok(Theme::Neon),
        "gray" | "grey" | "mono" => Ok(Theme::Gray),
        _ => Err(format!("invalid theme: {} (see --list-colors)", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_has_requested_steps() {
        let p = build_palette(Theme::Cyan, ColorMode::TrueColor, Background::Black);
        assert_eq!(p.ramp.len(), RAMP_STEPS);
    }

    #[test]
    fn shade_clamps_and_is_monotone_at_ends() {
        let p = build_palette(Theme::Sky, ColorMode::TrueColor, Background::Black);
        assert_eq!(p.shade(-1.0), p.shade(0.0));
        assert_eq!(p.shade(7.5), p.shade(1.0));
        assert_ne!(p.shade(0.0), p.shade(1.0));
    }

    #[test]
    fn mono_mode_uses_default_foreground() {
        let p = build_palette(Theme::Cyan, ColorMode::Mono, Background::Default);
        assert_eq!(p.shade(0.9), None);
        assert_eq!(p.bg, None);
    }

    #[test]
    fn ansi256_quantization_stays_in_palette_range() {
        for &(r, g, b) in theme_stops(Theme::Aurora) {
            let v = rgb_to_ansi256(r, g, b);
            assert!(v >= 16);
        }
    }

    #[test]
    fn parse_theme_accepts_aliases() {
        assert_eq!(parse_theme("skyblue").unwrap(), Theme::Sky);
        assert_eq!(parse_theme("GREY").unwrap(), Theme::Gray);
        assert!(parse_theme("plaid").is_err());
    }
}
