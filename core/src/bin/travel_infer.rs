use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use travel_inference_core::cli::{pretty, split_requests, summary_line};
use travel_inference_core::json_api::{dispatch, Operation};
use travel_inference_core::{load_config, EngineConfig, TravelInferenceEngine};

#[derive(Parser, Debug)]
#[command(name = "travel-infer", about = "Run travel inference operations on JSON requests")]
struct Args {
    /// detect_trip, classify_mode, predict_purpose, detect_companions,
    /// score_routes, aggregate_patterns, track_analytics or check_geofences
    op: String,

    /// Request JSON file (`-` for stdin). A top-level array runs as a batch.
    request: PathBuf,

    /// EngineConfig JSON; defaults when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print responses
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Print a one-line summary per response to stderr
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Dump prometheus counters after the run
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

fn read_request(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading request from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("reading request {}", path.display()))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let op: Operation = args.op.parse()?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let engine = TravelInferenceEngine::new(config)?;

    let calls = split_requests(&read_request(&args.request)?)?;
    info!("running {} {op} call(s)", calls.len());

    for (i, call) in calls.iter().enumerate() {
        let out = dispatch(&engine, op, call).with_context(|| format!("{op} call #{i} failed"))?;
        if args.summary {
            if let Some(line) = summary_line(op, &out) {
                eprintln!("[{i}] {line}");
            }
        }
        if args.pretty {
            println!("{}", pretty(&out)?);
        } else {
            println!("{out}");
        }
    }

    if args.metrics {
        print!("{}", engine.metrics().gather_text()?);
    }
    Ok(())
}
