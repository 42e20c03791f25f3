//! Region OCR
//!
//! Lets the user drag a rectangle over a page, captures the visible page,
//! crops the rectangle and sends it to an OCR service. The page is
//! simulated from a screenshot file; the backend is any HTTP service
//! speaking the `/v1/ocr` + `/healthz` contract.

mod capture;
mod config;
mod error;
mod ocr;
mod paths;
mod selection;
mod session;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use capture::{CaptureHost, FileScreenSource, capture_and_crop};
use config::AppConfig;
use ocr::result::boxes;
use ocr::{HttpTransport, OcrLang, OcrTransport};
use selection::{AmbientTransform, PointerKind, ScreenRect, SimulatedPage, Viewport};
use session::{ConsolePanel, InputEvent, LogNotifier, SessionReport, SessionRunner};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("region_ocr.log");
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Select a page region and recognize its text", long_about = None)]
struct Cli {
    /// Path to config.json (default: next to the executable, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full selection session and show the recognized text
    Select(SelectArgs),
    /// Capture and crop a region without OCR
    Crop(CropArgs),
    /// Check that the OCR backend is reachable
    Health,
}

/// The simulated page a session runs on.
#[derive(Args, Debug)]
struct PageArgs {
    /// Screenshot served by the capture host
    screenshot: PathBuf,

    /// Viewport size in CSS pixels, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800", value_parser = parse_size)]
    viewport: (f64, f64),

    /// Zoom applied to the page by its own styles
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Offset applied to the page by its own styles, as X,Y
    #[arg(long, default_value = "0,0", value_parser = parse_pair, allow_hyphen_values = true)]
    offset: (f64, f64),
}

#[derive(Args, Debug)]
struct SelectArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Drag in screen coordinates, as X0,Y0:X1,Y1
    #[arg(long, value_parser = parse_drag, allow_hyphen_values = true)]
    drag: ((f64, f64), (f64, f64)),

    /// Recognition language, overriding the config (auto, ch, en, ch_en)
    #[arg(long)]
    lang: Option<OcrLang>,

    /// Copy the recognized text to the clipboard
    #[arg(long)]
    copy: bool,

    /// Save each crop under the crops directory before upload
    #[arg(long)]
    save_crop: bool,
}

#[derive(Args, Debug)]
struct CropArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Region in viewport CSS pixels, as X,Y,W,H
    #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
    rect: ScreenRect,

    /// Where to write the PNG crop
    #[arg(short, long)]
    output: PathBuf,
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("'{}': {}", v, e))
    };
    Ok((parse(x)?, parse(y)?))
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    parse_pair(&format!("{},{}", w, h))
}

fn parse_drag(s: &str) -> Result<((f64, f64), (f64, f64)), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected X0,Y0:X1,Y1, got '{}'", s))?;
    Ok((parse_pair(from)?, parse_pair(to)?))
}

fn parse_rect(s: &str) -> Result<ScreenRect, String> {
    let parts = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(ScreenRect::new(*x, *y, *w, *h)),
        _ => Err(format!("expected X,Y,W,H, got '{}'", s)),
    }
}

impl PageArgs {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.0, self.viewport.1)
    }

    fn build_page(&self) -> SimulatedPage {
        let ambient = AmbientTransform {
            translate_x: self.offset.0,
            translate_y: self.offset.1,
            ..AmbientTransform::scale(self.zoom)
        };
        SimulatedPage::new(self.viewport(), ambient).with_user_select("auto")
    }

    fn spawn_capture_host(&self) -> Result<CaptureHost> {
        if !self.screenshot.exists() {
            return Err(anyhow!("Screenshot not found: {}", self.screenshot.display()));
        }
        CaptureHost::spawn(FileScreenSource::new(&self.screenshot))
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        eprintln!("[PANIC]{} {}", location, msg);
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    paths::ensure_directories().context("Failed to create output directories")?;
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Select(args) => run_select(&config, args),
        Command::Crop(args) => run_crop(&config, args),
        Command::Health => run_health(&config),
    }
}

/// Hotkey, drag, and whatever the session does with it.
fn run_select(config: &AppConfig, args: SelectArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(lang) = args.lang {
        config.ocr.lang = lang;
    }
    let config = &config;

    let host = args.page.spawn_capture_host()?;
    let transport = HttpTransport::new(config).context("Failed to create HTTP client")?;
    let mut notifier = LogNotifier;
    let mut panel = ConsolePanel::new();

    log(&format!(
        "Session on {}x{} viewport (zoom {}, offset {:?}), hotkey {}",
        args.page.viewport.0, args.page.viewport.1, args.page.zoom, args.page.offset, config.hotkey
    ));

    let report = {
        let mut runner = SessionRunner::new(
            config,
            args.page.build_page(),
            &host,
            &transport,
            &mut notifier,
            &mut panel,
        );
        if args.save_crop {
            runner = runner.with_crop_dir(paths::get_crops_dir());
        }

        match runner.handle_event(InputEvent::Key(config.hotkey.press())) {
            SessionReport::Started => {}
            SessionReport::Failed(e) => return Err(e.into()),
            other => return Err(anyhow!("Session did not start: {:?}", other)),
        }

        let ((x0, y0), (x1, y1)) = args.drag;
        runner.pointer_at(PointerKind::Down, x0, y0);
        if let SessionReport::Selecting(Some(rect)) = runner.pointer_at(PointerKind::Move, x1, y1) {
            log(&format!("Dragged to ({}, {}) {}", rect.x, rect.y, rect.size_label()));
        }
        runner.pointer_at(PointerKind::Up, x1, y1)
    };
    host.shutdown();

    match report {
        SessionReport::Recognized(outcome) => {
            for line in boxes(&outcome.body) {
                log(&format!("  {:?} {:?} ({:.2})", line.text, line.bbox, line.confidence));
            }
            if args.copy {
                panel.copy_to_clipboard()?;
            }
            Ok(())
        }
        SessionReport::Discarded => {
            log("Nothing selected");
            Ok(())
        }
        SessionReport::Failed(e) => Err(e.into()),
        other => Err(anyhow!("Unexpected session end: {:?}", other)),
    }
}

fn run_crop(config: &AppConfig, args: CropArgs) -> Result<()> {
    let host = args.page.spawn_capture_host()?;
    let cropped = capture_and_crop(&host, args.page.viewport(), args.rect, config.jpeg_quality)?;
    host.shutdown();

    cropped
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to save crop to {}", args.output.display()))?;
    let (width, height) = cropped.dimensions();
    let source = cropped.source;
    log(&format!(
        "Crop {}x{} of screenshot region ({}, {}) saved to {}",
        width,
        height,
        source.x,
        source.y,
        args.output.display()
    ));
    Ok(())
}

fn run_health(config: &AppConfig) -> Result<()> {
    let transport = HttpTransport::new(config).context("Failed to create HTTP client")?;
    transport.health_check()?;
    log(&format!("OCR backend reachable at {}", config.health_url()));
    Ok(())
}
