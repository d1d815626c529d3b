//! `poseval` binary: evaluation of pose estimation and tracking (PoseTrack).
//!
//! # Usage
//!
//! ```bash
//! poseval -g gt/ -p pred/ -e -t -o out/
//! poseval -g gt/ -p pred/ -t -s --config eval.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use poseval_rs::{frame_store, report, EvalConfig, Evaluator, Result};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "poseval",
    version,
    about = "Evaluation of Pose Estimation and Tracking (PoseTrack)",
    long_about = None
)]
struct Args {
    /// Directory containing ground truth annotations per sequence in json format.
    #[arg(short = 'g', long = "groundTruth", value_name = "DIR")]
    ground_truth: PathBuf,

    /// Directory containing predictions per sequence in json format.
    #[arg(short = 'p', long = "predictions", value_name = "DIR")]
    predictions: PathBuf,

    /// Evaluate per-frame multi-person pose estimation using the AP metric.
    #[arg(short = 'e', long = "evalPoseEstimation", default_value_t = false)]
    eval_pose: bool,

    /// Evaluate video-based multi-person pose tracking using MOT metrics.
    #[arg(short = 't', long = "evalPoseTracking", default_value_t = false)]
    eval_tracking: bool,

    /// Save evaluation results per sequence.
    #[arg(short = 's', long = "saveEvalPerSequence", default_value_t = false)]
    save_per_sequence: bool,

    /// Output directory to save the results.
    #[arg(short = 'o', long = "outputDir", value_name = "DIR", default_value = "./out")]
    output_dir: PathBuf,

    /// Optional JSON evaluation config; flags override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EvalConfig::from_json(path)?
        }
        None => EvalConfig::default(),
    };
    if args.save_per_sequence {
        config.save_per_sequence = true;
    }

    info!("Loading data");
    let pairs = frame_store::load_directories(&args.ground_truth, &args.predictions, &config)?;
    let num_frames: usize = pairs.iter().map(|p| p.num_frames()).sum();
    info!("# sequences: {}  # frames: {}", pairs.len(), num_frames);

    let evaluator = Evaluator::new(config)?;

    if args.eval_pose {
        let pose = evaluator.evaluate_pose(&pairs)?;
        println!("Average Precision (AP) metric:");
        print!("{}", report::format_ap_table(&pose.total));
        pose.save(&args.output_dir)?;
    }

    if args.eval_tracking {
        let tracking = evaluator.evaluate_tracking(&pairs)?;
        println!("Multiple Object Tracking (MOT) metrics:");
        print!("{}", report::format_mot_table(&tracking.total));
        tracking.save(&args.output_dir)?;
    }

    if !args.eval_pose && !args.eval_tracking {
        info!("Nothing to evaluate: pass -e and/or -t");
    }

    Ok(())
}
