#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kpalette::{
    kmeans::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE},
    ImagePipeline, KmeansOptions, DEFAULT_PALETTE_SIZE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reduce an image to k colors with k-means and save it next to the original.
#[derive(Parser)]
#[command(version, about)]
pub struct Options {
    /// The image to quantize.
    #[arg(long, default_value = "fries.png")]
    input: PathBuf,

    /// Where to write the original and quantized images side by side.
    #[arg(long, default_value = "compressed_image.png")]
    output: PathBuf,

    /// The number of colors in the palette.
    #[arg(short, long = "colors", default_value_t = DEFAULT_PALETTE_SIZE)]
    k: u32,

    /// The seed for the k-means++ initialization.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// The maximum number of iterations in each k-means run.
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Stop a run once the total squared centroid movement is at most this.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,

    /// The number of k-means runs, keeping the best.
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Cluster every pixel instead of each unique color.
    #[arg(long)]
    no_dedup: bool,

    /// 0 uses all cores, 1 runs single-threaded.
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    /// Log each k-means run. RUST_LOG takes precedence.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let Options {
        input,
        output,
        k,
        seed,
        max_iterations,
        tolerance,
        runs,
        no_dedup,
        threads,
        verbose,
    } = Options::parse();

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    macro_rules! timed {
        ($name: literal, $val: expr) => {{
            let time = std::time::Instant::now();
            let value = $val;
            info!(elapsed_ms = time.elapsed().as_millis(), "{} finished", $name);
            value
        }};
    }

    let image = timed!("read image", kpalette::open_image(&input))?;

    let mut pipeline = ImagePipeline::try_from(&image)
        .with_context(|| format!("cannot quantize {}", input.display()))?;

    pipeline
        .palette_size(k)
        .dedup_pixels(!no_dedup)
        .kmeans_options(
            KmeansOptions::new()
                .seed(seed)
                .max_iterations(max_iterations)
                .tolerance(tolerance)
                .runs(runs),
        );

    let comparison = timed!(
        "quantization and remapping",
        match threads {
            0 => pipeline.side_by_side_rgbimage_par(),
            1 => pipeline.side_by_side_rgbimage(),
            t => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(t.into())
                    .build()
                    .context("failed to build the thread pool")?;

                pool.install(|| pipeline.side_by_side_rgbimage_par())
            }
        }
    )
    .with_context(|| format!("failed to quantize {} to {k} colors", input.display()))?;

    timed!("write image", kpalette::save_image(&comparison, &output))?;

    info!(input = %input.display(), output = %output.display(), k, "done");
    Ok(())
}
