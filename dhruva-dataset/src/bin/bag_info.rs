//! CLI tool for inspecting bag files.
//!
//! Displays metadata and statistics about recorded bag files.
//!
//! # Usage
//!
//! ```bash
//! bag_info recording.bag
//! bag_info --verbose recording.bag
//! ```

use std::path::PathBuf;

use clap::Parser;

use dhruva_dataset::{BagMessage, BagPlayer, PointCloud3D};

/// Display information about a bag file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Bag file to inspect
    bag: PathBuf,

    /// Show per-type breakdown and cloud statistics
    #[arg(short, long)]
    verbose: bool,

    /// Count actual messages (reads entire file)
    #[arg(short, long)]
    count: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut player = BagPlayer::open(&args.bag)?;

    let header = player.header().clone();

    println!("Bag File Information");
    println!("====================");
    println!("File: {}", args.bag.display());
    println!();

    println!("Header Information:");
    println!("  Format version: {}", header.version);
    println!("  Flags: 0x{:04x}", header.flags);
    println!(
        "  Start time: {} us ({:.3} s)",
        header.start_time_us,
        header.start_time_us as f64 / 1_000_000.0
    );
    println!(
        "  End time: {} us ({:.3} s)",
        header.end_time_us,
        header.end_time_us as f64 / 1_000_000.0
    );
    println!("  Duration: {:.3} seconds", header.duration_secs());
    println!("  Message count (header): {}", header.message_count);
    println!("  Pose samples (header): {}", header.pose_count);
    println!("  Point clouds (header): {}", header.cloud_count);
    println!();

    if !(args.count || args.verbose) {
        return Ok(());
    }

    println!("Scanning messages...");
    player.rewind()?;

    let mut pose_count = 0u64;
    let mut cloud_count = 0u64;
    let mut total_points = 0usize;
    let mut max_points = 0usize;
    let mut first_cloud: Option<PointCloud3D> = None;
    let mut first_timestamp: Option<u64> = None;
    let mut last_timestamp = 0u64;

    while let Some(msg) = player.next_message()? {
        let ts = msg.timestamp_us();
        first_timestamp.get_or_insert(ts);
        last_timestamp = ts;

        match &msg {
            BagMessage::PoseSample(_) => pose_count += 1,
            BagMessage::PointCloud(cloud) => {
                cloud_count += 1;
                total_points += cloud.data.len();
                max_points = max_points.max(cloud.data.len());
                if first_cloud.is_none() {
                    first_cloud = Some(cloud.data.clone());
                }
            }
        }
    }

    let total_count = pose_count + cloud_count;
    let actual_duration = last_timestamp.saturating_sub(first_timestamp.unwrap_or(0));

    println!();
    println!("Message Statistics:");
    println!("  Total messages: {}", total_count);
    println!(
        "  Pose samples: {} ({:.1}%)",
        pose_count,
        100.0 * pose_count as f64 / total_count.max(1) as f64
    );
    println!(
        "  Point clouds: {} ({:.1}%)",
        cloud_count,
        100.0 * cloud_count as f64 / total_count.max(1) as f64
    );

    let duration_secs = actual_duration as f64 / 1_000_000.0;
    if duration_secs > 0.0 {
        println!();
        println!("Rates:");
        println!("  Overall: {:.1} Hz", total_count as f64 / duration_secs);
        if pose_count > 0 {
            println!("  Pose samples: {:.1} Hz", pose_count as f64 / duration_secs);
        }
        if cloud_count > 0 {
            println!("  Point clouds: {:.1} Hz", cloud_count as f64 / duration_secs);
        }
    }

    if args.verbose && cloud_count > 0 {
        println!();
        println!("Point Clouds:");
        println!(
            "  Mean points per cloud: {:.0}",
            total_points as f64 / cloud_count as f64
        );
        println!("  Max points per cloud: {}", max_points);
        if let Some(cloud) = &first_cloud
            && let (Some(centroid), Some((lo, hi))) = (cloud.centroid(), cloud.bounds())
        {
            println!(
                "  First cloud centroid: ({:.3}, {:.3}, {:.3})",
                centroid.x, centroid.y, centroid.z
            );
            println!(
                "  First cloud extent: ({:.2}, {:.2}, {:.2}) .. ({:.2}, {:.2}, {:.2})",
                lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
            );
        }
    }

    Ok(())
}
