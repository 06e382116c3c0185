//! Dataset generator.
//!
//! Replays a recorded bag through the odometry pipeline and writes one
//! cloud and one odometry record per kept scan into the output directory.
//! Re-running over the same directory resumes: scans with an existing
//! record are loaded instead of registered.
//!
//! # Usage
//!
//! ```bash
//! dataset_generator --config dhruva-dataset.toml --bag recording.bag
//! dataset_generator --bag recording.bag --output out/ --keep-one-out-of 3 --review
//! RUST_LOG=debug dataset_generator --bag recording.bag --dry-run
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use dhruva_dataset::engine::{ConsoleReviewer, ReviewPort};
use dhruva_dataset::{BagPlayer, DatasetConfig, DatasetGenerator};

/// Build a loop-closed odometry dataset from a recorded bag
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bag file to replay (overrides input.bag)
    #[arg(short, long)]
    bag: Option<PathBuf>,

    /// Output directory (overrides output.directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep one point cloud out of every k (overrides input.keep_one_out_of)
    #[arg(short = 'k', long)]
    keep_one_out_of: Option<usize>,

    /// Ask for confirmation after every registration
    #[arg(long)]
    review: bool,

    /// Keep results in memory, write nothing
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<DatasetConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::default(),
    };

    if let Some(bag) = &args.bag {
        config.input.bag = Some(bag.clone());
    }
    if let Some(output) = &args.output {
        config.output.directory = output.clone();
    }
    if let Some(k) = args.keep_one_out_of {
        config.input.keep_one_out_of = k;
    }
    if args.review {
        config.review.required = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let bag_path = config
        .input
        .bag
        .clone()
        .ok_or("no bag file given (use --bag or input.bag)")?;

    log::info!("dataset_generator starting");
    log::info!("  Input: {}", bag_path.display());
    log::info!("  Output: {}", config.output.directory.display());
    log::info!("  Keep one out of: {}", config.input.keep_one_out_of);
    log::info!(
        "  Review: {}",
        if config.review.required {
            "enabled"
        } else {
            "disabled"
        }
    );
    if !config.loop_markers.is_empty() {
        log::info!("  Loop markers: {}", config.loop_markers.len());
    }

    let reviewer: Option<Box<dyn ReviewPort>> = if config.review.required {
        Some(Box::new(ConsoleReviewer::stdio(
            config.review.viewer_command.clone(),
        )))
    } else {
        None
    };

    let player = BagPlayer::open(&bag_path)?;
    log::info!(
        "Bag: {} messages over {:.1} s",
        player.message_count(),
        player.duration_secs()
    );

    let mut generator = DatasetGenerator::from_config(&config, reviewer, args.dry_run)?;
    let summary = generator.run(player)?;

    println!();
    println!("Dataset Summary");
    println!("===============");
    println!("  Clouds read: {}", summary.clouds_seen);
    println!("  Scans processed: {}", summary.processed);
    println!("  Loaded from checkpoints: {}", summary.loaded);
    println!("  Registrations: {}", summary.registration_calls);
    if !summary.skipped.is_empty() {
        println!("  Skipped scans: {:?}", summary.skipped);
    }

    Ok(())
}
