//! # Catprint CLI
//!
//! Command-line interface for preparing cat printer jobs offline.
//!
//! ## Usage
//!
//! ```bash
//! # List built-in printer profiles
//! catprint profiles
//!
//! # Dump the byte stream for a photo, dithered
//! catprint render --dither --out photo.bin photo.jpg
//!
//! # Preview what a graphics job would look like on paper
//! catprint render --mode graphics --png preview.png label.png
//!
//! # Use a custom printer profile
//! catprint render --profile-json mx10.json --out job.bin logo.png
//! ```
//!
//! Set `RUST_LOG=catprint=debug` for per-operation logging.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use catprint::{
    CatPrintError, PrinterProfile, Session, SessionConfig,
    render::bitmap::{self, BitmapEncoder},
    render::dither::PixelPolicy,
    session::ImageJob,
    transport::FileTransport,
};

/// Catprint - BLE thermal cat printer utility
#[derive(Parser, Debug)]
#[command(name = "catprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an image into a print job
    Render {
        /// Image file to print
        image: PathBuf,

        /// Built-in printer profile
        #[arg(long, default_value = "gb01")]
        profile: String,

        /// Load the printer profile from a JSON file instead
        #[arg(long, value_name = "FILE")]
        profile_json: Option<PathBuf>,

        /// How the image is turned into scanlines
        #[arg(long, value_enum, default_value_t = Mode::Raster)]
        mode: Mode,

        /// Use Bayer ordered dithering (for photos)
        #[arg(long)]
        dither: bool,

        /// Write the encoded byte stream to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Write a preview of the printed scanlines as PNG
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
    },

    /// List built-in printer profiles as JSON
    Profiles,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Luminance threshold, every line sent
    Raster,
    /// Dark opaque pixels only, blank lines skipped, fed line by line
    Graphics,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catprint=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CatPrintError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Profiles => {
            let json = serde_json::to_string_pretty(&PrinterProfile::built_in())
                .map_err(|e| CatPrintError::Io(e.into()))?;
            println!("{}", json);
            Ok(())
        }
        Commands::Render {
            image,
            profile,
            profile_json,
            mode,
            dither,
            out,
            png,
        } => {
            let profile = match profile_json {
                Some(path) => PrinterProfile::from_json(&std::fs::read_to_string(path)?)?,
                None => PrinterProfile::by_name(&profile)?,
            };

            let source = image::open(&image)?;
            let mut job = match mode {
                Mode::Raster => ImageJob::raster(source),
                Mode::Graphics => ImageJob::graphics(source),
            };
            if dither {
                job = job.with_policy(PixelPolicy::Bayer);
            }

            if let Some(path) = png {
                write_preview(&profile, &job, &path)?;
            }

            let name = profile.advertised_name.clone();
            let mut session = Session::with_config(profile, SessionConfig::immediate());
            session.set_name(name);
            session
                .enqueue_prologue()
                .draw_image(job)
                .enqueue_epilogue();

            match out {
                Some(path) => {
                    let mut transport = FileTransport::new(&path);
                    let report = session.print(&mut transport).await?;
                    println!(
                        "Wrote {} frames ({} bytes) to {}",
                        report.frames,
                        report.bytes,
                        path.display()
                    );
                }
                None => {
                    let frames = session.frames()?;
                    let bytes: usize = frames.iter().map(|f| f.encoded_len()).sum();
                    println!(
                        "{} operations, {} frames, {} bytes (use --out to save)",
                        session.queue().len(),
                        frames.len(),
                        bytes
                    );
                }
            }

            Ok(())
        }
    }
}

fn write_preview(profile: &PrinterProfile, job: &ImageJob, path: &Path) -> Result<(), CatPrintError> {
    let encoder = BitmapEncoder::for_profile(profile, job.policy, job.blank_lines);
    let lines = encoder.render(&job.image);
    bitmap::to_preview(&lines, encoder.width_dots()).save(path)?;
    println!("Saved {} lines to {}", lines.len(), path.display());
    Ok(())
}
