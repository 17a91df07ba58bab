// Copyright (c) 2026 glowveil contributors

mod canvas;
mod clock;
mod clouds;
mod config;
mod frame;
mod glyph;
mod grid;
mod palette;
mod runtime;
mod scene;
mod terminal;
mod viewport;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::canvas::Canvas;
use crate::clouds::{CloudField, CloudParams};
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, print_list_colors,
    Args, ColorBg, GlyphArg, SceneArg,
};
use crate::frame::Frame;
use crate::glyph::compose;
use crate::grid::{GridField, GridParams};
use crate::palette::{build_palette, parse_theme, Background, Theme};
use crate::runtime::{ColorMode, GlyphMode};
use crate::scene::{Driver, Overlay, Scene};
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::viewport::Viewport;

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("GLOWVEIL_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return match m {
            0 => ColorMode::Mono,
            8 => ColorMode::Color256,
            24 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,8,24)", m);
                std::process::exit(1);
            }
        };
    }

    detect_color_mode_auto()
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Mono => "mono",
        ColorMode::Color16 => "16-color",
    }
}

fn theme_for_digit(c: char) -> Option<Theme> {
    match c {
        '1' => Some(Theme::Cyan),
        '2' => Some(Theme::Sky),
        '3' => Some(Theme::Aurora),
        '4' => Some(Theme::Violet),
        '5' => Some(Theme::Ember),
        '6' => Some(Theme::Mint),
        '7' => Some(Theme::Gold),
        '8' => Some(Theme::Ice),
        '9' => Some(Theme::Neon),
        '0' => Some(Theme::Gray),
        _ => None,
    }
}

fn build_scene(
    kind: SceneArg,
    grid_params: GridParams,
    cloud_params: CloudParams,
    vp: Viewport,
    seed: u64,
) -> Box<dyn Scene> {
    match kind {
        SceneArg::Grid => Box::new(GridField::new(grid_params, vp.width(), vp.height(), seed)),
        SceneArg::Clouds => Box::new(CloudField::new(cloud_params, vp.width(), vp.height(), seed)),
        SceneArg::Both => {
            // Independent engines on one canvas, each with its own RNG
            // stream; the grid draws first so clouds glow over it.
            let grid = GridField::new(grid_params, vp.width(), vp.height(), seed);
            let clouds = CloudField::new(
                cloud_params,
                vp.width(),
                vp.height(),
                seed ^ 0x9E37_79B9_7F4A_7C15,
            );
            Box::new(Overlay::new(vec![Box::new(grid), Box::new(clouds)]))
        }
    }
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches_from(env::args_os());
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(auto));
        if args.colormode.is_some() {
            println!("  forced: {}", color_mode_label(effective));
        }
        println!("  effective: {}", color_mode_label(effective));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args.duration.map(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s > 0.0 {
            return require_f64_range("--duration", s, 0.1, 86400.0);
        }
        s
    });

    let mut theme = match parse_theme(&args.color) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let color_mode = detect_color_mode(&args);
    let background = match args.color_bg {
        ColorBg::Black => Background::Black,
        ColorBg::DefaultBackground => Background::Default,
        ColorBg::Transparent => Background::Transparent,
    };
    let mut glyph_mode = match args.glyphs {
        GlyphArg::Braille => GlyphMode::Braille,
        GlyphArg::Blocks => GlyphMode::Blocks,
    };

    let spacing = require_f32_range("--spacing", args.spacing, 4.0, 256.0);
    let grid_params = GridParams {
        spacing_x: spacing,
        spacing_y: spacing,
        front_speed_min: args.front_speed.low as f32,
        front_speed_max: args.front_speed.high as f32,
        front_width_cells: require_f32_range("--front-width", args.front_width, 0.25, 32.0),
        on_rate: require_f32_range("--on-rate", args.on_rate, 0.0, 1000.0),
        decay: require_f32_range("--decay", args.decay, 0.0, 100.0),
        jump: require_f32_range("--jump", args.jump, 0.0, 1.0),
        flicker_amp: require_f32_range("--flicker", args.flicker, 0.0, 1.0),
        threshold: require_f32_range("--threshold", args.threshold, 0.0, 1.0),
        ..GridParams::default()
    };

    let cloud_params = CloudParams {
        count: require_u16_range("--clouds", args.clouds, 0, 200) as usize,
        min_radius: args.radius.low as f32,
        max_radius: args.radius.high as f32,
        points_per_cloud: require_u16_range("--points", args.points, 3, 128) as usize,
        base_speed: require_f32_range("--cloud-speed", args.cloud_speed, 0.001, 1000.0),
        speed_variance: require_f32_range("--speed-variance", args.speed_variance, 0.0, 1.0),
        vertical_drift: require_f32_range("--drift", args.drift, 0.0, 100.0),
        chaos: require_f32_range("--chaos", args.chaos, 0.0, 4.0),
        mouse_influence: require_f32_range("--mouse-influence", args.mouse_influence, 0.0, 10.0),
        hover_radius: require_f32_range("--hover-radius", args.hover_radius, 0.0, 500.0),
        hover_flip_chance: require_f32_range("--flip-chance", args.flip_chance, 0.0, 1.0),
        collision_padding: require_f32_range("--collision-padding", args.collision_padding, 0.1, 2.0),
        collision_impulse: require_f32_range("--impulse", args.impulse, 0.0, 10000.0),
        max_rightward_ratio: require_f32_range("--max-rightward", args.max_rightward, 0.0, 1.0),
        sparkle: !args.no_sparkle,
        sparkle_hz: require_f32_range("--sparkle-hz", args.sparkle_hz, 0.01, 30.0),
        ..CloudParams::default()
    };

    let seed = args.seed.unwrap_or_else(rand::random);

    let mut term = Terminal::new(!args.no_mouse)?;
    let (w, h) = term.size()?;
    let mut vp = Viewport::new(w, h);

    let mut palette = build_palette(theme, color_mode, background);
    let scene = build_scene(args.scene, grid_params, cloud_params, vp, seed);
    let mut driver = Driver::new(scene, target_fps);
    driver.start(Instant::now());

    let mut canvas = Canvas::new(vp.sub_width(), vp.sub_height());
    let mut frame = Frame::new(vp.cols, vp.rows, palette.bg);

    let start_time = Instant::now();
    let end_time = duration_s.and_then(|s| {
        if s <= 0.0 {
            return None;
        }
        Some(start_time + Duration::from_secs_f64(s))
    });

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let target_period_s = target_period.as_secs_f32().max(0.000_001);

    let mut perf_frames: u64 = 0;
    let mut perf_drawn_frames: u64 = 0;
    let mut perf_work_sum_s: f64 = 0.0;
    let mut perf_work_max_s: f32 = 0.0;
    let mut perf_overshoot_frames: u64 = 0;

    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                let ev = Terminal::read_event()?;
                match ev {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::FocusLost => {
                        driver.pointer_left();
                    }
                    Event::Mouse(me) => match me.kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                            let (x, y) = vp.pointer_pos(me.column, me.row);
                            driver.pointer_moved(x, y);
                        }
                        _ => {}
                    },
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }

                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => running = false,
                            KeyCode::Char(' ') => {
                                driver.resize(vp.width(), vp.height());
                            }
                            KeyCode::Char('p') => {
                                if driver.is_running() {
                                    driver.stop();
                                } else {
                                    driver.start(Instant::now());
                                }
                            }
                            KeyCode::Tab => {
                                glyph_mode = glyph_mode.cycled();
                                frame.clear_to_blank(palette.bg);
                            }
                            KeyCode::Char(c) => {
                                if let Some(t) = theme_for_digit(c) {
                                    theme = t;
                                    palette = build_palette(theme, color_mode, background);
                                    frame.clear_to_blank(palette.bg);
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            match driver.deadline() {
                Some(deadline) => {
                    if now >= deadline {
                        break;
                    }
                    let mut timeout = deadline - now;
                    if let Some(end) = end_time {
                        if now >= end {
                            break;
                        }
                        timeout = timeout.min(end - now);
                    }
                    let _ = Terminal::poll_event(timeout)?;
                }
                // Paused: sit on the event queue until something happens.
                None => {
                    let _ = Terminal::poll_event(Duration::from_millis(100))?;
                    if end_time.is_some_and(|end| Instant::now() >= end) {
                        break;
                    }
                }
            }
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            vp = Viewport::new(nw, nh);
            canvas = Canvas::new(vp.sub_width(), vp.sub_height());
            frame = Frame::new(vp.cols, vp.rows, palette.bg);
            driver.resize(vp.width(), vp.height());
        }

        let work_start = Instant::now();
        if driver.tick(work_start, &mut canvas) {
            compose(&canvas, &mut frame, &palette, glyph_mode);
            let did_draw = frame.has_changes();
            if did_draw {
                term.draw(&mut frame)?;
            }
            let work_s = work_start.elapsed().as_secs_f32();

            if args.perf_stats {
                perf_frames = perf_frames.saturating_add(1);
                if did_draw {
                    perf_drawn_frames = perf_drawn_frames.saturating_add(1);
                }
                perf_work_sum_s += work_s as f64;
                perf_work_max_s = perf_work_max_s.max(work_s);
                if work_s > target_period_s {
                    perf_overshoot_frames = perf_overshoot_frames.saturating_add(1);
                }
            }
        }
    }

    driver.destroy();

    if args.perf_stats {
        drop(term);
        let elapsed = start_time.elapsed();
        let elapsed_s = elapsed.as_secs_f64().max(0.000_001);

        let frames = perf_frames.max(1);
        let avg_work_ms = (perf_work_sum_s / frames as f64) * 1000.0;
        let avg_fps = (perf_frames as f64) / elapsed_s;
        let drawn_ratio = (perf_drawn_frames as f64) / (perf_frames as f64).max(1.0);

        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", avg_fps);
        println!("  frames: {}", perf_frames);
        println!(
            "  drawn_frames: {} ({:.1}%)",
            perf_drawn_frames,
            drawn_ratio * 100.0
        );
        println!("  avg_work_ms: {:.3}", avg_work_ms);
        println!("  max_work_ms: {:.3}", perf_work_max_s as f64 * 1000.0);
        println!(
            "  overshoot_frames: {} ({:.1}%)",
            perf_overshoot_frames,
            (perf_overshoot_frames as f64) / (perf_frames as f64).max(1.0) * 100.0
        );
    }

    Ok(())
}
