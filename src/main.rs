mod active;
mod app;
mod blocks;
mod color;
mod config;
mod controller;
mod error;
mod grid;
mod headless;
mod presets;
mod record;
mod render;
mod schedule;
mod settings;
mod simulation;
mod surface;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use headless::HeadlessOptions;
use presets::PresetManager;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::{Boundary, Settings, SpawnRule};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "sandpile-sim")]
#[command(about = "Abelian sandpile simulation in the terminal")]
struct Args {
    // === Simulation Parameters ===
    /// Grains placed on the center cell
    #[arg(short = 'g', long)]
    grains: Option<u64>,

    /// Grains a cell must hold to topple (2-1024)
    #[arg(short = 't', long)]
    threshold: Option<u64>,

    /// Cell size in pixels
    #[arg(long = "point-size")]
    point_size: Option<u32>,

    /// Milliseconds between steps (0 = run straight to the stable pile)
    #[arg(short = 'd', long)]
    delay: Option<u64>,

    /// Render after every step when running with no delay
    #[arg(long = "draw-fast-forward")]
    draw_fast_forward: bool,

    /// Boundary rule (inclusive, strict)
    #[arg(long)]
    boundary: Option<String>,

    /// Grains given to newly created neighbors (single, share)
    #[arg(long)]
    spawn: Option<String>,

    // === Visual Parameters ===
    /// Draw every cell black instead of shading by grain count
    #[arg(long = "no-adaptive")]
    no_adaptive: bool,

    /// Brightness held back from white by the color ramp (0-255)
    #[arg(long = "color-offset")]
    color_offset: Option<u8>,

    // === Configuration ===
    /// Start from a named preset
    #[arg(short = 'p', long)]
    preset: Option<String>,

    /// Load settings from this JSON file instead of the default config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved settings to this JSON file and continue
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    // === Headless Mode ===
    /// Run to stability without a terminal UI
    #[arg(long)]
    headless: bool,

    /// Headless surface width in pixels
    #[arg(long, default_value = "400")]
    width: u32,

    /// Headless surface height in pixels
    #[arg(long, default_value = "400")]
    height: u32,

    /// Save the final surface as a PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Record rendered frames to an animated GIF
    #[arg(long)]
    record: Option<PathBuf>,

    /// Keep every Nth rendered frame in the recording
    #[arg(long = "frame-every", default_value = "1")]
    frame_every: usize,

    /// Write log output to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_boundary(s: &str) -> Boundary {
    match s.to_lowercase().as_str() {
        "strict" | "exact" => Boundary::Strict,
        _ => Boundary::Inclusive,
    }
}

fn parse_spawn(s: &str) -> SpawnRule {
    match s.to_lowercase().as_str() {
        "share" | "shared" | "uniform" => SpawnRule::Share,
        _ => SpawnRule::Single,
    }
}

/// Defaults, then the config file, then the preset, then explicit flags
fn resolve_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Some(AppConfig::load_from_file(path)?),
        None => AppConfig::load_default()?,
    };
    let mut settings = config.map(|c| c.settings).unwrap_or_default();

    if let Some(name) = &args.preset {
        settings = PresetManager::new().find(name)?.settings.clone();
    }

    if let Some(grains) = args.grains {
        settings.initial_grains = grains;
    }
    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    if let Some(point_size) = args.point_size {
        settings.point_size = point_size;
    }
    if let Some(delay) = args.delay {
        settings.step_delay_ms = delay;
    }
    if args.draw_fast_forward {
        settings.draw_on_fast_forward = true;
    }
    if let Some(boundary) = &args.boundary {
        settings.boundary = parse_boundary(boundary);
    }
    if let Some(spawn) = &args.spawn {
        settings.spawn_rule = parse_spawn(spawn);
    }
    if args.no_adaptive {
        settings.adaptive_color = false;
    }
    if let Some(offset) = args.color_offset {
        settings.adaptive_color_offset = offset;
    }

    settings.validate()?;
    Ok(settings)
}

fn init_logging(args: &Args) -> io::Result<()> {
    // The terminal UI owns the screen, so it stays quiet unless asked
    let default_filter = if args.headless || args.log_file.is_some() {
        "info"
    } else {
        "off"
    };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = &args.log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let settings = resolve_settings(&args)?;

    if let Some(path) = &args.save_config {
        let config = AppConfig {
            settings: settings.clone(),
            ..Default::default()
        };
        config.save_to_file(path)?;
        log::info!("saved config to {}", path.display());
    }

    if args.headless {
        let options = HeadlessOptions {
            width: args.width,
            height: args.height,
            snapshot: args.snapshot.clone(),
            record: args.record.clone(),
            frame_every: args.frame_every.max(1),
        };
        let report = headless::run(settings, &options)?;
        println!(
            "simulation stopped after {} steps in {} ms",
            report.steps,
            report.elapsed.as_millis()
        );
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Get initial terminal size and create app
    let size = terminal.size()?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), false);
    let res = App::new(canvas_width, canvas_height, settings)
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|mut app| {
            run_app(&mut terminal, &mut app)?;
            Ok(app)
        });

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match res {
        Ok(app) => {
            if let Some(report) = app.controller.last_report() {
                eprintln!(
                    "simulation stopped after {} steps in {} ms",
                    report.steps,
                    report.elapsed.as_millis()
                );
            }
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn canvas_for(width: u16, height: u16, fullscreen: bool) -> (u16, u16) {
    ui::get_canvas_size(Rect::new(0, 0, width, height), fullscreen)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Paint requests run right before the frame is drawn
        app.paint();
        terminal.draw(|frame| ui::render(frame, app))?;

        // Wake up early when a step timer is due
        let timeout = app
            .queue
            .time_until_next(Instant::now())
            .map_or(FRAME_DURATION, |due| due.min(FRAME_DURATION));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_running(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reinit(),
                        KeyCode::Char('h') | KeyCode::Char('H') => app.toggle_help(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.save_snapshot(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            let size = terminal.size()?;
                            let (w, h) = canvas_for(size.width, size.height, app.fullscreen_mode);
                            app.resize(w, h);
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.increase_speed();
                            app.focus = Focus::Delay;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.decrease_speed();
                            app.focus = Focus::Delay;
                        }
                        KeyCode::Char('a') | KeyCode::Char('A') => {
                            app.toggle_adaptive_color();
                            app.focus = Focus::Adaptive;
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if !app.show_help {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Down => {
                            if !app.show_help {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else {
                                app.focus = Focus::None;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = canvas_for(width, height, app.fullscreen_mode);
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Fire due step timers
        app.tick(Instant::now());
    }
}
