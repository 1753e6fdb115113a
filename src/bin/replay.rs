use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use fusion_tracker_rs::sensors::{parse_json_line, parse_line};
use fusion_tracker_rs::{FusionConfig, FusionEkf, MeasurementPackage};
use serde_json::json;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a measurement log (text or .jsonl, optionally .gz)
    #[arg(long)]
    log: PathBuf,

    /// JSON filter configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only print the final summary
    #[arg(long, default_value_t = false)]
    summary_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum LogFormat {
    Text,
    JsonLines,
}

fn detect_format(path: &Path) -> LogFormat {
    // Look through a trailing .gz for the real extension
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim_end_matches(".gz");
    if name.ends_with(".jsonl") || name.ends_with(".json") {
        LogFormat::JsonLines
    } else {
        LogFormat::Text
    }
}

fn open_log(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Read every packet in the log. Lines that fail to parse are logged and
/// counted, not fatal.
fn load_log(path: &Path) -> anyhow::Result<(Vec<MeasurementPackage>, usize)> {
    let format = detect_format(path);
    let reader = open_log(path)?;

    let mut packages = Vec::new();
    let mut malformed = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed = match format {
            LogFormat::Text => parse_line(trimmed),
            LogFormat::JsonLines => parse_json_line(trimmed),
        };
        match parsed {
            Ok(pkg) => packages.push(pkg),
            Err(e) => {
                log::warn!("{}:{}: {}", path.display(), idx + 1, e);
                malformed += 1;
            }
        }
    }
    Ok((packages, malformed))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => FusionConfig::from_json_file(path)?,
        None => FusionConfig::default(),
    };
    let mut ekf = FusionEkf::new(config)?;

    let (packages, malformed) = load_log(&args.log)?;
    log::info!(
        "Replaying {} packets from {} ({} malformed lines)",
        packages.len(),
        args.log.display(),
        malformed
    );

    let mut rejected = 0usize;
    for pkg in &packages {
        if let Err(e) = ekf.process_measurement(pkg) {
            // Skipped updates still advance the filter; anything else dropped the packet
            if !e.is_skipped_update() {
                rejected += 1;
            }
        }
        if args.summary_only {
            continue;
        }
        if let Some(snapshot) = ekf.snapshot() {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    }

    let last = ekf.snapshot();
    let summary = json!({
        "log": args.log.display().to_string(),
        "packets": packages.len(),
        "malformed_lines": malformed,
        "rejected_packets": rejected,
        "final": last,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
