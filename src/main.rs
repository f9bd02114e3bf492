//! OCR Monitor
//!
//! Command-line front end: list capture targets, run a single capture through
//! the OCR pipeline, or monitor a region on a timer.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use ocr_monitor::capture::{ImageSource, XcapScreen};
use ocr_monitor::config::{AppConfig, load_config};
use ocr_monitor::monitor::{SessionManager, csv_writer};
use ocr_monitor::ocr::build_recognizer;
use ocr_monitor::paths;
use ocr_monitor::pipeline::{AnalysisSettings, CaptureRequest, Pipeline};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to logs/ocr-monitor.log next to the executable
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List capturable windows
    Windows,
    /// List displays
    Displays,
    /// Capture once, run OCR and print the parsed fields
    Capture {
        #[command(flatten)]
        target: Target,
        /// Read an image file instead of taking a screenshot
        #[arg(long, conflicts_with_all = ["display", "window"])]
        file: Option<PathBuf>,
        /// Where to save the image sent to OCR
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Repeat capture and OCR on a timer until Ctrl-C
    Monitor {
        #[arg(long, default_value = "default")]
        session: String,
        /// Tick interval in milliseconds (overrides config)
        #[arg(long)]
        interval: Option<u64>,
        #[command(flatten)]
        target: Target,
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Display index
    #[arg(long)]
    display: Option<usize>,
    /// Window id (see `windows`)
    #[arg(long, conflicts_with = "display")]
    window: Option<u32>,
}

impl Target {
    fn source(&self) -> ImageSource {
        match self.window {
            Some(id) => ImageSource::window(id),
            None => ImageSource::display(self.display),
        }
    }
}

fn init_logging(to_file: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_default_env();

    if to_file {
        let opened = paths::ensure_directories().and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(paths::get_log_file())
        });
        match opened {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Failed to open log file: {}", e),
        }
    }
    builder.init();

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
        error!("[PANIC]{} {}", location, msg);
        eprintln!("[PANIC]{} {}", location, msg);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file);

    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    let config = load_config(&config_path);

    let recognizer =
        build_recognizer(&config.recognizer).context("Failed to set up text recognizer")?;
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(XcapScreen),
        recognizer,
        AnalysisSettings::from(&config),
    ));

    match cli.command {
        Command::Windows => {
            let windows = pipeline.windows().await?;
            println!("{}", serde_json::to_string_pretty(&windows)?);
        }
        Command::Displays => {
            let displays = pipeline.displays().await?;
            println!("{}", serde_json::to_string_pretty(&displays)?);
        }
        Command::Capture { target, file, save } => {
            let source = match file {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    ImageSource::upload(bytes)
                }
                None => target.source(),
            };
            run_capture(&pipeline, CaptureRequest::new(source), save.as_deref()).await?;
        }
        Command::Monitor {
            session,
            interval,
            target,
            duration,
        } => {
            let interval_ms = interval.unwrap_or(config.interval_ms);
            let request = CaptureRequest::new(target.source());
            run_monitor(pipeline, &config, session, interval_ms, request, duration).await?;
        }
    }

    Ok(())
}

async fn run_capture(
    pipeline: &Pipeline,
    request: CaptureRequest,
    save: Option<&Path>,
) -> Result<()> {
    let analysis = pipeline.analyze(&request).await?;

    let path = match save {
        Some(path) => path.to_path_buf(),
        None => {
            paths::ensure_directories().context("Failed to create output directories")?;
            paths::crop_output_path(&analysis.captured_at)
        }
    };
    analysis
        .image
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    info!("Saved OCR input to {}", path.display());

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_monitor(
    pipeline: Arc<Pipeline>,
    config: &AppConfig,
    session_id: String,
    interval_ms: u64,
    request: CaptureRequest,
    duration: Option<u64>,
) -> Result<()> {
    let csv_path = config.csv_path.as_deref().map(paths::resolve_config_path);
    if let Some(csv_path) = &csv_path {
        csv_writer::init_csv(csv_path)?;
        info!("Appending results to {}", csv_path.display());
    }

    let manager = SessionManager::new(pipeline);
    let mut events = manager.subscribe();
    manager.start(session_id.clone(), interval_ms, request)?;

    let deadline = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping");
                break;
            }
            _ = &mut deadline => {
                info!("Duration elapsed, stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if let Some(csv_path) = &csv_path {
                        if let Err(e) = csv_writer::append_to_csv(csv_path, &event) {
                            warn!("Failed to write CSV row: {}", e);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    if let Some(history) = manager.history(&session_id) {
        println!("{}", serde_json::to_string_pretty(&history)?);
    }
    manager.stop(&session_id);
    Ok(())
}
