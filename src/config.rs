// Copyright (c) 2026 glowveil contributors

use std::io::IsTerminal;
use std::str::FromStr;

use clap::Parser;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  glowveil --scene clouds --color cyan --glyphs braille --color-bg black --fps 60 --spacing 16 --front-speed 18,40 --on-rate 3 --decay 1.1 --clouds 10 --radius 9,20 --cloud-speed 6 --chaos 0.65 --sparkle-hz 1.6";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  glowveil") {
            out.push_str("  \x1b[1;34mglowveil\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  -") {
            out.push_str("  \x1b[33m-");
            out.push_str(rest);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        out.push_str(line);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneArg {
    #[value(name = "grid")]
    Grid,
    #[value(name = "clouds")]
    Clouds,
    #[value(name = "both")]
    Both,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphArg {
    #[value(name = "braille")]
    Braille,
    #[value(name = "blocks")]
    Blocks,
}

/// "LOW,HIGH" pair of finite positive floats with low <= high.
#[derive(Clone, Copy, Debug)]
pub struct F64Range {
    pub low: f64,
    pub high: f64,
}

impl FromStr for F64Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| "expected: LOW,HIGH".to_string())?;
        let low: f64 = a
            .trim()
            .parse()
            .map_err(|_| "invalid low value".to_string())?;
        let high: f64 = b
            .trim()
            .parse()
            .map_err(|_| "invalid high value".to_string())?;
        if !low.is_finite() || !high.is_finite() {
            return Err("range values must be finite".to_string());
        }
        if low <= 0.0 || high <= 0.0 || low > high {
            return Err("range must be >0 and low <= high".to_string());
        }
        Ok(Self { low, high })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "glowveil", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 's',
        long = "scene",
        default_value_t = SceneArg::Clouds,
        value_enum,
        help_heading = "GENERAL",
        help = "Scene to render (grid, clouds, both)"
    )]
    pub scene: SceneArg,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random source for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 'x',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "no-mouse",
        help_heading = "GENERAL",
        help = "Do not capture the mouse (disables pointer interaction)"
    )]
    pub no_mouse: bool,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "cyan",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        short = 'g',
        long = "glyphs",
        default_value_t = GlyphArg::Braille,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Glyph mode (braille, blocks)"
    )]
    pub glyphs: GlyphArg,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,8,24). Default: 24-bit if supported (COLORTERM), else 8-bit (TERM=...256color)"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "spacing",
        default_value_t = 16.0,
        help_heading = "GRID",
        help = "Lattice spacing in sub-cells (min 4 max 256)"
    )]
    pub spacing: f32,

    #[arg(
        long = "front-speed",
        default_value = "18,40",
        help_heading = "GRID",
        help = "Front speed range in sub-cells/s: LOW,HIGH"
    )]
    pub front_speed: F64Range,

    #[arg(
        long = "front-width",
        default_value_t = 2.0,
        help_heading = "GRID",
        help = "Excitation band width in grid cells (min 0.25 max 32)"
    )]
    pub front_width: f32,

    #[arg(
        long = "on-rate",
        default_value_t = 3.0,
        help_heading = "GRID",
        help = "Excitation rate at the front center (min 0 max 1000)"
    )]
    pub on_rate: f32,

    #[arg(
        long = "decay",
        default_value_t = 1.1,
        help_heading = "GRID",
        help = "Activation decay rate (min 0 max 100)"
    )]
    pub decay: f32,

    #[arg(
        long = "jump",
        default_value_t = 0.45,
        help_heading = "GRID",
        help = "Activation bump per excitation event (min 0 max 1)"
    )]
    pub jump: f32,

    #[arg(
        long = "flicker",
        default_value_t = 0.02,
        help_heading = "GRID",
        help = "Flicker noise amplitude (min 0 max 1)"
    )]
    pub flicker: f32,

    #[arg(
        long = "threshold",
        default_value_t = 0.05,
        help_heading = "GRID",
        help = "Visibility threshold (min 0 max 1)"
    )]
    pub threshold: f32,

    #[arg(
        short = 'n',
        long = "clouds",
        default_value_t = 10,
        help_heading = "CLOUDS",
        help = "Cloud count (min 0 max 200)"
    )]
    pub clouds: u16,

    #[arg(
        long = "radius",
        default_value = "9,20",
        help_heading = "CLOUDS",
        help = "Cloud radius range in sub-cells: LOW,HIGH"
    )]
    pub radius: F64Range,

    #[arg(
        long = "points",
        default_value_t = 24,
        help_heading = "CLOUDS",
        help = "Outline points per cloud (min 3 max 128)"
    )]
    pub points: u16,

    #[arg(
        long = "cloud-speed",
        default_value_t = 6.0,
        help_heading = "CLOUDS",
        help = "Leftward drift speed in sub-cells/s (min 0.001 max 1000)"
    )]
    pub cloud_speed: f32,

    #[arg(
        long = "speed-variance",
        default_value_t = 0.45,
        help_heading = "CLOUDS",
        help = "Per-cloud speed variance (min 0 max 1)"
    )]
    pub speed_variance: f32,

    #[arg(
        long = "drift",
        default_value_t = 3.5,
        help_heading = "CLOUDS",
        help = "Vertical drift range in sub-cells/s (min 0 max 100)"
    )]
    pub drift: f32,

    #[arg(
        long = "chaos",
        default_value_t = 0.65,
        help_heading = "CLOUDS",
        help = "Outline jitter strength (min 0 max 4)"
    )]
    pub chaos: f32,

    #[arg(
        long = "mouse-influence",
        default_value_t = 0.4,
        help_heading = "CLOUDS",
        help = "Pointer repulsion strength (min 0 max 10)"
    )]
    pub mouse_influence: f32,

    #[arg(
        long = "hover-radius",
        default_value_t = 24.0,
        help_heading = "CLOUDS",
        help = "Pointer repulsion radius in sub-cells (min 0 max 500)"
    )]
    pub hover_radius: f32,

    #[arg(
        long = "flip-chance",
        default_value_t = 0.08,
        help_heading = "CLOUDS",
        help = "Per-tick chance a hovered cloud flips vertically (min 0 max 1)"
    )]
    pub flip_chance: f32,

    #[arg(
        long = "collision-padding",
        default_value_t = 0.9,
        help_heading = "CLOUDS",
        help = "Collision radius padding factor (min 0.1 max 2)"
    )]
    pub collision_padding: f32,

    #[arg(
        long = "impulse",
        default_value_t = 46.0,
        help_heading = "CLOUDS",
        help = "Collision impulse scale (min 0 max 10000)"
    )]
    pub impulse: f32,

    #[arg(
        long = "max-rightward",
        default_value_t = 0.6,
        help_heading = "CLOUDS",
        help = "Rightward nudge cap as a fraction of drift speed (min 0 max 1)"
    )]
    pub max_rightward: f32,

    #[arg(
        long = "no-sparkle",
        help_heading = "CLOUDS",
        help = "Disable the pulsing center sparkle"
    )]
    pub no_sparkle: bool,

    #[arg(
        long = "sparkle-hz",
        default_value_t = 1.6,
        help_heading = "CLOUDS",
        help = "Sparkle pulse frequency in Hz (min 0.01 max 30)"
    )]
    pub sparkle_hz: f32,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print performance statistics summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn print_list_colors() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE COLOR THEMES:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --color.\x1b[0m");
    } else {
        println!("AVAILABLE COLOR THEMES:");
        println!("NOTE: Use only the VALUE (left side) with --color.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("cyan         Electric cyan (the classic grid look)");
    println!("sky          Soft sky blue (the classic clouds look)");
    println!("aurora       Teal-green aurora");
    println!("violet       Violet (alias: purple)");
    println!("ember        Warm ember (alias: fire)");
    println!("mint         Pale mint green");
    println!("gold         Amber gold");
    println!("ice          Frosted blue-white (alias: snow)");
    println!("neon         Hot magenta neon (alias: synthwave)");
    println!("gray         Grayscale (aliases: grey, mono)");
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  glowveil [OPTIONS]\n\nGENERAL:\n  -s, --scene <grid|clouds|both>\n      Which animation to render.\n      Example: glowveil --scene grid\n\n  --seed <number>\n      Seed the random source for a reproducible run.\n      Example: glowveil --seed 7\n\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: glowveil --duration 10\n\n  -x, --screensaver\n      Exit on the first keypress.\n      Example: glowveil -x\n\n  --no-mouse\n      Do not capture the mouse; pointer interaction is off.\n      Example: glowveil --no-mouse\n\nAPPEARANCE:\n  -c, --color <name>\n      Set theme (see --list-colors).\n      Example: glowveil --color sky\n\n  -g, --glyphs <braille|blocks>\n      Sub-cell braille dots or whole-cell shade blocks.\n      Example: glowveil --glyphs blocks\n\n  --colormode <0|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: glowveil --colormode 24\n\n  --color-bg <black|default-background|transparent>\n      Background mode.\n      Example: glowveil --color-bg transparent\n\nGRID:\n  --spacing <number>\n      Lattice spacing in sub-cells (min 4 max 256).\n      Example: glowveil --scene grid --spacing 20\n\n  --front-speed <low,high>\n      Front travel speed range in sub-cells/s.\n      Example: glowveil --front-speed 10,30\n\n  --front-width <number>\n      Excitation band width in grid cells (min 0.25 max 32).\n\n  --on-rate <number>\n      Excitation rate at the front center (min 0 max 1000).\n\n  --decay <number>\n      Activation decay rate (min 0 max 100).\n\n  --jump <number>\n      Activation bump per excitation event (min 0 max 1).\n\n  --flicker <number>\n      Flicker noise amplitude (min 0 max 1).\n\n  --threshold <number>\n      Visibility threshold (min 0 max 1).\n\nCLOUDS:\n  -n, --clouds <number>\n      Cloud count (min 0 max 200).\n      Example: glowveil -n 14\n\n  --radius <low,high>\n      Cloud radius range in sub-cells.\n      Example: glowveil --radius 12,26\n\n  --points <number>\n      Outline points per cloud (min 3 max 128).\n\n  --cloud-speed <number>\n      Leftward drift in sub-cells/s (min 0.001 max 1000).\n\n  --speed-variance <number>\n      Per-cloud speed variance (min 0 max 1).\n\n  --drift <number>\n      Vertical drift range in sub-cells/s (min 0 max 100).\n\n  --chaos <number>\n      Outline jitter strength (min 0 max 4).\n\n  --mouse-influence <number>\n      Pointer repulsion strength (min 0 max 10).\n\n  --hover-radius <number>\n      Pointer repulsion radius in sub-cells (min 0 max 500).\n\n  --flip-chance <number>\n      Per-tick chance a hovered cloud flips vertically (min 0 max 1).\n\n  --collision-padding <number>\n      Collision radius padding factor (min 0.1 max 2).\n\n  --impulse <number>\n      Collision impulse scale (min 0 max 10000).\n\n  --max-rightward <number>\n      Rightward nudge cap as a fraction of drift speed (min 0 max 1).\n\n  --no-sparkle\n      Disable the pulsing center sparkle.\n\n  --sparkle-hz <number>\n      Sparkle pulse frequency in Hz (min 0.01 max 30).\n\nPERFORMANCE:\n  -f, --fps <number>\n      Target FPS (min 1 max 240).\n      Example: glowveil --fps 30\n\n  --perf-stats\n      Print performance statistics summary on exit.\n      Example: glowveil --duration 10 --perf-stats\n\nHELP:\n  --check-bitcolor\n      Print detected terminal color capability and exit.\n\n  --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  --list-colors\n      List available color themes and exit.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }

    let tail = "\nKEYS WHILE RUNNING:\n  q, Esc       quit\n  space        reseed the population\n  p            pause / resume\n  Tab          cycle glyph mode\n  1-9, 0       switch color theme\n\nLIMITS / VALID RANGES:\n";
    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(tail));
    } else {
        print!("{}", tail);
    }
    println!("  --duration <seconds>     min 0.1 max 86400 (<=0 disables)");
    println!("  --fps <number>           min 1 max 240");
    println!("  --spacing <number>       min 4 max 256");
    println!("  --front-speed <low,high> each >0, low <= high");
    println!("  --radius <low,high>      each >0, low <= high");
    println!("  --clouds <number>        min 0 max 200");
    println!("  --points <number>        min 3 max 128");
    println!("  --colormode <0|8|24>     allowed values only (8==256, 24==32)");
    println!();
    print_list_colors();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_low_high() {
        let r: F64Range = "9,20".parse().unwrap();
        assert_eq!(r.low, 9.0);
        assert_eq!(r.high, 20.0);
    }

    #[test]
    fn range_rejects_bad_input() {
        assert!("20,9".parse::<F64Range>().is_err());
        assert!("0,5".parse::<F64Range>().is_err());
        assert!("nope".parse::<F64Range>().is_err());
        assert!("1".parse::<F64Range>().is_err());
        assert!("inf,5".parse::<F64Range>().is_err());
    }

    #[test]
    fn range_tolerates_whitespace() {
        let r: F64Range = " 1.5 , 3 ".parse().unwrap();
        assert_eq!(r.low, 1.5);
        assert_eq!(r.high, 3.0);
    }
}
