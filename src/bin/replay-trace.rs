//! Runs a recorded accelerometer trace through the [`TempoEstimator`] and
//! prints every available estimate. Useful to check the analysis against real
//! recordings.
//!
//! The trace is a CSV file with the columns `timestamp_ms,x,y,z`. A header
//! line is optional.
//!
//! Usage: `replay-trace <trace.csv> [capacity] [cadence] [--spectrum]`

use log::LevelFilter;
use motion_tempo::{AnalyzerKind, EstimatorConfig, TempoEstimator};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::exit;
use std::time::Duration;

fn init_logger() {
    let res = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_colors(true)
        .with_utc_timestamps()
        .init();
    if let Err(e) = res {
        eprintln!("Can't initialize logger: {e}");
    }
}

fn parse_line(line: &str) -> Option<(Duration, f32, f32, f32)> {
    let mut fields = line.split(',').map(str::trim);
    let timestamp_ms = fields.next()?.parse::<f64>().ok()?;
    let x = fields.next()?.parse::<f32>().ok()?;
    let y = fields.next()?.parse::<f32>().ok()?;
    let z = fields.next()?.parse::<f32>().ok()?;
    let timestamp = Duration::try_from_secs_f64(timestamp_ms / 1000.0).ok()?;
    Some((timestamp, x, y, z))
}

fn config_from_args(args: &[String]) -> EstimatorConfig {
    let number = |index: usize, default: usize| {
        args.get(index)
            .filter(|arg| !arg.starts_with("--"))
            .map(|arg| {
                arg.parse::<usize>().unwrap_or_else(|_| {
                    log::error!("Not a number: {arg}");
                    exit(1);
                })
            })
            .unwrap_or(default)
    };
    let capacity = number(2, EstimatorConfig::DEFAULT_CAPACITY);
    let cadence = number(3, EstimatorConfig::DEFAULT_ANALYSIS_CADENCE);

    let config = EstimatorConfig::new(capacity, cadence).unwrap_or_else(|e| {
        log::error!("Invalid configuration: {e}");
        exit(1);
    });
    if args.iter().any(|arg| arg == "--spectrum") {
        config.with_analyzer(AnalyzerKind::Spectrum)
    } else {
        config
    }
}

fn main() {
    init_logger();

    let args = std::env::args().collect::<Vec<_>>();
    let Some(path) = args.get(1) else {
        log::error!("Usage: replay-trace <trace.csv> [capacity] [cadence] [--spectrum]");
        exit(1);
    };
    let config = config_from_args(&args);
    log::info!("Using {config:?}");

    let file = File::open(path).unwrap_or_else(|e| {
        log::error!("Can't open {path}: {e}");
        exit(1);
    });

    let mut estimator = TempoEstimator::new(config);
    let mut skipped_lines = 0;
    let mut estimates = 0;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.unwrap_or_else(|e| {
            log::error!("Can't read {path}: {e}");
            exit(1);
        });
        let Some((timestamp, x, y, z)) = parse_line(&line) else {
            // header or garbage
            if line_no > 0 {
                log::warn!("Skipping line {}: {line}", line_no + 1);
            }
            skipped_lines += 1;
            continue;
        };

        let estimate = estimator.record_at(x, y, z, timestamp);
        if estimate.is_available() {
            estimates += 1;
            println!("{:>10.3}s  {estimate}", timestamp.as_secs_f32());
        }
    }

    log::info!(
        "{} samples, {skipped_lines} skipped lines, {estimates} estimates",
        estimator.history().total_pushed()
    );
}
