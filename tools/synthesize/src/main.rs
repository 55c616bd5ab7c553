/// Synthetic field-data generator: writes a `{ raw_values, statistics }` feed
/// with a smooth vegetation index over a jittered sampling grid.
///
/// Readings are Perlin octaves remapped to (0, 1), stored under the dated
/// NDVI property names in rotation so every alias gets exercised.
use std::fs;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use fieldview_core::ingest::{ReportedQuartiles, ReportedStatistics, DEFAULT_VALUE_ALIASES};
use fieldview_core::sample::Sample;
use fieldview_core::stats::FieldStatistics;
use log::{info, LevelFilter};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use simple_logger::SimpleLogger;

// ── Constants ────────────────────────────────────────────────────────────────

const OCTAVES: usize = 4;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "synthesize", about = "Write a synthetic field-data JSON feed")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "field.json")]
    output: PathBuf,

    /// South-west corner latitude
    #[arg(long, default_value = "16.900", allow_hyphen_values = true)]
    lat: f64,

    /// South-west corner longitude
    #[arg(long, default_value = "81.100", allow_hyphen_values = true)]
    lng: f64,

    /// Grid rows and columns
    #[arg(long, default_value = "40")]
    grid: usize,

    /// Grid spacing in degrees
    #[arg(long, default_value = "0.0002", allow_hyphen_values = true)]
    spacing: f64,

    /// Positional jitter as a fraction of the spacing
    #[arg(long, default_value = "0.35", allow_hyphen_values = true)]
    jitter: f64,

    /// Fraction of records written malformed (no geometry, short coordinates, bad value)
    #[arg(long, default_value = "0.0")]
    malformed: f64,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

// ── Generation ───────────────────────────────────────────────────────────────

/// Vegetation index in (0, 1) at grid position (r, c).
fn vegetation(perlin: &Perlin, r: f64, c: f64, grid: f64) -> f64 {
    let mut freq = 3.0 / grid;
    let mut amp = 1.0;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for _ in 0..OCTAVES {
        sum += amp * perlin.get([c * freq, r * freq]);
        norm += amp;
        freq *= 2.0;
        amp *= 0.5;
    }
    (0.5 + 0.5 * sum / norm).clamp(0.01, 0.99)
}

fn malformed_record(rng: &mut StdRng, lat: f64, lng: f64) -> Value {
    match rng.gen_range(0..3) {
        0 => json!({ "NDVI_2023-06-14": 0.5 }),
        1 => json!({ "geometry": { "coordinates": [lng] }, "NDVI_2023-06-14": 0.5 }),
        _ => json!({ "geometry": { "coordinates": [lng, lat] }, "NDVI_2023-06-14": "n/a" }),
    }
}

/// Feed-style statistics block over the raw (0–1) readings.
fn summarize(samples: &[Sample]) -> Option<ReportedStatistics> {
    let stats = FieldStatistics::compute(samples)?;
    Some(ReportedStatistics {
        mean: stats.mean,
        std: stats.std,
        quartiles: ReportedQuartiles { q25: stats.q25, q50: stats.median, q75: stats.q75 },
    })
}

fn check(args: &Args) -> Result<()> {
    ensure!(args.spacing.is_finite() && args.spacing > 0.0, "--spacing must be positive");
    ensure!(args.jitter.is_finite() && args.jitter >= 0.0, "--jitter must be non-negative");
    ensure!((0.0..=1.0).contains(&args.malformed), "--malformed must be within 0..=1");
    ensure!(args.lat.is_finite() && args.lng.is_finite(), "corner coordinates must be finite");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init()?;
    check(&args)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let perlin = Perlin::new(args.seed as u32);
    let grid = args.grid as f64;

    let mut records = Vec::with_capacity(args.grid * args.grid);
    let mut samples = Vec::with_capacity(args.grid * args.grid);
    let mut broken = 0usize;

    for r in 0..args.grid {
        for c in 0..args.grid {
            let j = args.spacing * args.jitter;
            let lat = args.lat + r as f64 * args.spacing + rng.gen_range(-j..=j);
            let lng = args.lng + c as f64 * args.spacing + rng.gen_range(-j..=j);

            if rng.gen_bool(args.malformed) {
                records.push(malformed_record(&mut rng, lat, lng));
                broken += 1;
                continue;
            }

            let value = vegetation(&perlin, r as f64, c as f64, grid);
            samples.push(Sample { lat, lng, value });
            let key = DEFAULT_VALUE_ALIASES[(r * args.grid + c) % DEFAULT_VALUE_ALIASES.len()];
            records.push(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [lng, lat] },
                key: value,
            }));
        }
    }

    let mut doc = json!({ "raw_values": records });
    if let Some(stats) = summarize(&samples) {
        doc["statistics"] = serde_json::to_value(stats)?;
    }

    let text = serde_json::to_string_pretty(&doc)?;
    fs::write(&args.output, text)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    info!(
        "wrote {} records ({} malformed) to {}",
        args.grid * args.grid,
        broken,
        args.output.display()
    );
    Ok(())
}
