/// Offline overlay renderer: loads a field-data feed, fits a Web-Mercator
/// view to it, runs the overlay pipeline and writes the frame as a PNG.
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fieldview_core::sample::Sample;
use fieldview_core::{FieldOverlay, GeoBounds, MercatorViewport, OverlayConfig, Raster};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(name = "render", about = "Render a field vegetation overlay to PNG")]
struct Args {
    /// Field-data JSON (`{ "raw_values": [...] }`)
    input: PathBuf,

    #[arg(short, long, default_value = "overlay.png")]
    output: PathBuf,

    /// Overlay configuration JSON; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "800")]
    width: u32,

    #[arg(long, default_value = "600")]
    height: u32,

    /// Pixels kept free around the field when fitting the view
    #[arg(long, default_value = "40")]
    padding: f64,

    /// Overrides the configured opacity (clamped to 0.2–1.0)
    #[arg(long)]
    opacity: Option<f64>,

    /// Dot every raw sample
    #[arg(long)]
    markers: bool,

    /// Paint onto a dark basemap colour instead of leaving the background transparent
    #[arg(long)]
    flatten: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

const BASEMAP: [u8; 3] = [38, 44, 38];

fn load_config(path: Option<&PathBuf>) -> Result<OverlayConfig> {
    let Some(path) = path else {
        return Ok(OverlayConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    OverlayConfig::from_json(&text).with_context(|| format!("bad config {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init()?;

    let mut config = load_config(args.config.as_ref())?;
    if args.markers {
        config.show_sample_markers = true;
    }

    let mut overlay = FieldOverlay::new(config)?;
    if let Some(opacity) = args.opacity {
        overlay.set_opacity(opacity)?;
    }

    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let report = overlay.load_document(&json)?;
    info!(
        "{} valid / {} rejected (geometry {}, coordinates {}, non-finite {})",
        report.valid_count,
        report.rejected_count,
        report.missing_geometry,
        report.too_few_coordinates,
        report.non_finite
    );
    if let Some(stats) = overlay.statistics() {
        info!(
            "values: mean {:.1}, std {:.1}, quartiles {:.1} / {:.1} / {:.1}",
            stats.mean, stats.std, stats.q25, stats.median, stats.q75
        );
    }

    let Some(bounds) = GeoBounds::from_points(overlay.samples().iter().map(Sample::position))
    else {
        bail!("{}", overlay.error_message().unwrap_or("no field data available"));
    };
    let view = MercatorViewport::fit(bounds, args.width, args.height, args.padding);
    info!("view zoom {} centred at {:.6}, {:.6}", view.zoom, view.center.lat, view.center.lng);

    let Some(frame) = overlay.redraw(&view)? else {
        bail!("viewport has no drawable area");
    };
    info!("{} cells, {} draw commands", frame.cell_count, frame.commands.len());

    let mut raster = Raster::new(frame.width, frame.height)?;
    raster.render(frame)?;

    let (w, h) = (raster.width(), raster.height());
    let saved = if args.flatten {
        let img = image::RgbImage::from_raw(w, h, raster.flatten_over(BASEMAP))
            .context("raster size mismatch")?;
        img.save(&args.output)
    } else {
        let img = image::RgbaImage::from_raw(w, h, raster.to_rgba8())
            .context("raster size mismatch")?;
        img.save(&args.output)
    };
    saved.with_context(|| format!("cannot write {}", args.output.display()))?;

    info!("wrote {}", args.output.display());
    Ok(())
}
