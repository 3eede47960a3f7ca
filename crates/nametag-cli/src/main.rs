use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nametag_core::{gallery, FileOutcome, Gallery, GalleryReload, OnnxFaceEngine};
use nametag_hw::Camera;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nametag-cli", about = "Nametag gallery scans and camera diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory of known-face images and report per-file results
    Scan {
        /// Directory containing .jpg/.jpeg/.png images, one face per file
        dir: PathBuf,
        /// Emit the reports as JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },
    /// List available V4L2 capture devices
    Devices,
    /// Capture frames from the configured camera and report basic stats
    Test {
        /// Number of frames to capture
        #[arg(long, default_value_t = 5)]
        frames: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { dir, json } => scan(&dir, json),
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("no capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({})", dev.path, dev.name, dev.driver);
            }
            Ok(())
        }
        Commands::Test { frames } => test_camera(frames),
    }
}

fn scan(dir: &std::path::Path, json: bool) -> Result<()> {
    let model_dir = std::env::var("NAMETAG_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| nametag_core::default_model_dir());

    let mut engine = OnnxFaceEngine::load(&model_dir)
        .with_context(|| format!("loading models from {}", model_dir.display()))?;

    let mut known = Gallery::new();
    let reports = gallery::load_directory(&mut engine, dir, &mut known, GalleryReload::Append)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        let name = report.path.display();
        match &report.outcome {
            FileOutcome::Loaded { label } => println!("loaded  {name} → {label}"),
            FileOutcome::NoFace => println!("no-face {name}"),
            FileOutcome::Failed { reason } => println!("error   {name}: {reason}"),
        }
    }
    let loaded = reports
        .iter()
        .filter(|r| matches!(r.outcome, FileOutcome::Loaded { .. }))
        .count();
    println!(
        "{loaded} of {} files loaded, gallery size {}",
        reports.len(),
        known.len()
    );
    Ok(())
}

fn test_camera(frames: usize) -> Result<()> {
    let device = std::env::var("NAMETAG_CAMERA_DEVICE").unwrap_or_else(|_| "/dev/video0".into());
    let camera = Camera::open(&device).with_context(|| format!("opening {device}"))?;
    println!("{device}: {}×{}", camera.width, camera.height);

    for i in 0..frames {
        let frame = camera
            .capture_frame()
            .with_context(|| format!("capturing frame {i}"))?;
        println!(
            "frame {i}: seq {} brightness {:.1}",
            frame.sequence,
            frame.avg_brightness()
        );
    }
    Ok(())
}
