//! BivarGis CLI - Bivariate raster classification and styling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bivargis_algorithms::pipeline::{run_bivariate, BivariateParams, OutputPaths};
use bivargis_core::io::read_geotiff;
use bivargis_core::{Raster, TracingFeedback, CRS};
use bivargis_style::{apply_style, write_style, Palette};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bivargis")]
#[command(author, version, about = "Bivariate raster classification", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Classify two rasters into terciles and combine them into
    /// bivariate codes (11-33)
    Bivariate {
        /// First input raster (A, e.g. temperature)
        input_a: PathBuf,
        /// Second input raster (B, e.g. precipitation)
        input_b: PathBuf,
        /// Output path for the class-A raster (values 1-3)
        #[arg(long, default_value = "class_a.tif")]
        class_a: PathBuf,
        /// Output path for the class-B raster (values 1-3)
        #[arg(long, default_value = "class_b.tif")]
        class_b: PathBuf,
        /// Output path for the combined bivariate raster (values 11-33)
        #[arg(short, long, default_value = "bivariate.tif")]
        output: PathBuf,
        /// Skip grid alignment (inputs must already share a grid)
        #[arg(long)]
        no_align: bool,
        /// EPSG code of the target CRS (defaults to raster A's CRS)
        #[arg(long)]
        target_crs: Option<u32>,
        /// Divide raster B before classification (e.g. monthly totals
        /// to daily means)
        #[arg(long)]
        divide_b: bool,
        /// Divisor applied to raster B when --divide-b is set
        #[arg(long, default_value = "30.0")]
        divisor_b: f64,
    },
    /// Generate a QML color style for a bivariate raster
    Style {
        /// Output QML style file
        output: PathBuf,
        /// Palette: purple-blue, orange-green, custom
        #[arg(short, long, default_value = "purple-blue")]
        palette: String,
        /// Custom palette: 9 comma-separated hex colors in code order
        /// 11,12,13,21,22,23,31,32,33
        #[arg(long)]
        colors: Option<String>,
        /// Apply the style to this raster as a .qml sidecar
        #[arg(long)]
        apply: Option<PathBuf>,
    },
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let (min_x, min_y, max_x, max_y) = raster.extent();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            let (px, py) = raster.transform().pixel_size();
            println!("Pixel size: {} x {}", px, py);
            println!(
                "Extent: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                min_x, min_y, max_x, max_y
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!(
                "Valid cells: {} ({:.1}%)",
                raster.valid_count(),
                100.0 * raster.valid_count() as f64 / raster.len() as f64
            );
        }

        // ── Bivariate pipeline ───────────────────────────────────────
        Commands::Bivariate {
            input_a,
            input_b,
            class_a,
            class_b,
            output,
            no_align,
            target_crs,
            divide_b,
            divisor_b,
        } => {
            let params = BivariateParams {
                align: !no_align,
                target_crs: target_crs.map(CRS::from_epsg),
                divisor_b: divide_b.then_some(divisor_b),
            };
            let outputs = OutputPaths {
                class_a,
                class_b,
                bivariate: output,
            };

            let pb = spinner("Running bivariate classification...");
            let start = Instant::now();
            let result = run_bivariate(&input_a, &input_b, &params, &outputs, &TracingFeedback)
                .context("Bivariate classification failed")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            println!(
                "Raster A terciles: q1={:.4}, q2={:.4}",
                result.boundaries_a.q1, result.boundaries_a.q2
            );
            println!(
                "Raster B terciles: q1={:.4}, q2={:.4}",
                result.boundaries_b.q1, result.boundaries_b.q2
            );
            println!("Class A saved to: {}", outputs.class_a.display());
            println!("Class B saved to: {}", outputs.class_b.display());
            println!("Bivariate saved to: {}", outputs.bivariate.display());
            println!("  Processing time: {:.2?}", elapsed);
        }

        // ── Style export ─────────────────────────────────────────────
        Commands::Style {
            output,
            palette,
            colors,
            apply,
        } => {
            let palette = match palette.to_lowercase().as_str() {
                "purple-blue" | "pb" => Palette::PurpleBlue,
                "orange-green" | "og" => Palette::OrangeGreen,
                "custom" => {
                    let colors = colors.context(
                        "Custom palette selected but no colors given. \
                         Pass --colors with 9 comma-separated hex codes.",
                    )?;
                    Palette::parse_custom(&colors).context("Invalid custom palette")?
                }
                other => anyhow::bail!(
                    "Unknown palette: {}. Use purple-blue, orange-green, or custom.",
                    other
                ),
            };

            write_style(&palette, &output).context("Failed to write style file")?;
            println!("Style saved to: {}", output.display());

            if let Some(raster) = apply {
                apply_style(&raster, &output, &TracingFeedback);
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &PathBuf) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}
