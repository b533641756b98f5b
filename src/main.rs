use clap::Parser;
use dendroheat::render::{render_png, render_svg, RenderOptions};
use dendroheat::{build_layout, load_table, Clustering, Linkage, Result};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dendroheat")]
#[command(version)]
#[command(
    about = "Draw a heatmap of a data table, optionally with a dendrogram from a linkage matrix.",
    long_about = None
)]
struct Args {
    // MANDATORY OPTIONS
    /// Load the raw data table (CSV or TSV, first column = row labels) from this FILE.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Write the heatmap to this FILE (PNG or SVG based on extension).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    // Dendrogram Options
    /// Linkage matrix FILE (rows of left, right, distance[, count]) enabling the dendrogram.
    #[arg(short = 'l', long = "linkage", value_name = "FILE")]
    linkage: Option<PathBuf>,

    /// Draw the heatmap alone even when a linkage matrix is given.
    #[arg(long = "no-dendrogram")]
    no_dendrogram: bool,

    // Visualization Options
    /// Side length in pixels of one heatmap cell.
    #[arg(short = 'c', long = "cell-size", value_name = "N", default_value_t = 24)]
    cell_size: u32,

    /// Width in pixels of the dendrogram band left of the heatmap.
    #[arg(short = 'd', long = "dendrogram-width", value_name = "N", default_value_t = 160)]
    dendrogram_width: u32,

    /// Title drawn above the heatmap.
    #[arg(long = "title", value_name = "STRING")]
    title: Option<String>,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn load_clustering(path: &Path) -> Result<Clustering> {
    info!("Loading linkage matrix from {:?}...", path);
    let linkage = Linkage::from_table(&load_table(path)?)?;
    debug!("Linkage has {} leaves", linkage.leaf_count());
    linkage.to_clustering()
}

fn run(args: &Args) -> Result<()> {
    let table = load_table(&args.input)?;
    info!(
        "Loaded {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let clustering = match (&args.linkage, args.no_dendrogram) {
        (Some(path), false) => Some(load_clustering(path)?),
        (Some(_), true) => {
            warn!("--no-dendrogram given, ignoring linkage matrix");
            None
        }
        (None, _) => None,
    };

    let layout = build_layout(&table, clustering.as_ref())?;

    let default_title = if layout.segments.is_some() {
        "Heatmap with Dendrogram"
    } else {
        "Heatmap"
    };
    let opts = RenderOptions {
        cell_size: args.cell_size,
        dendrogram_width: args.dendrogram_width,
        title: args.title.clone().unwrap_or_else(|| default_title.to_string()),
        ..RenderOptions::default()
    };

    // Detect output format by file extension
    let is_svg = args
        .out
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        info!("Rendering SVG...");
        let svg_content = render_svg(&layout, &opts);
        info!("Saving to {:?}...", args.out);
        let mut file = File::create(&args.out)?;
        file.write_all(svg_content.as_bytes())?;
    } else {
        info!("Rendering image...");
        let img = render_png(&layout, &opts);
        info!("Saving to {:?}...", args.out);
        img.save(&args.out)?;
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Could not configure {} threads: {}", threads, e);
        }
    }

    info!("Starting visualization...");

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
