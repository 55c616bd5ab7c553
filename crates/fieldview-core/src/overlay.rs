//! The field overlay: pipeline state, lifecycle and redraw handling.
//!
//! Raw samples, clusters and the boundary are rebuilt on every load; a redraw
//! only composes a new frame from them. A failed redraw keeps the last good
//! frame and moves the overlay into the error state until the next success.

use log::{info, warn};
use serde_json::Value;

use crate::cluster::{cluster_samples, ClusteredSample};
use crate::compositor::{compose, Frame, FrameInputs};
use crate::config::{OverlayConfig, MAX_OPACITY, MIN_OPACITY};
use crate::error::{OverlayError, Result};
use crate::hull::{convex_hull, BoundaryPolygon};
use crate::ingest::{ingest_records, FieldDocument, IngestReport, ReportedStatistics};
use crate::sample::Sample;
use crate::stats::FieldStatistics;
use crate::viewport::Viewport;

pub const NO_DATA_MESSAGE: &str = "no field data available";
pub const MAP_UNAVAILABLE_MESSAGE: &str = "Failed to load map. Please try again later.";
pub const REDRAW_FAILED_MESSAGE: &str = "Failed to create Voronoi diagram. Please try again later.";

/// What the surrounding dashboard should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayStatus {
    Loading,
    Ready,
    NoData,
    Error(String),
}

// ── Drawing-layer lifecycle ─────────────────────────────────────────────────

/// The map's overlay layer slot.
pub trait OverlayHost {
    fn attach_layer(&mut self) -> Result<()>;
    fn detach_layer(&mut self);
}

/// Holds the overlay layer attached; detaches when dropped.
pub struct Attachment<'h, H: OverlayHost + ?Sized> {
    host: &'h mut H,
}

impl<H: OverlayHost + ?Sized> Attachment<'_, H> {
    pub fn host(&mut self) -> &mut H {
        self.host
    }
}

impl<H: OverlayHost + ?Sized> Drop for Attachment<'_, H> {
    fn drop(&mut self) {
        self.host.detach_layer();
    }
}

// ── Overlay ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FieldOverlay {
    config: OverlayConfig,
    samples: Vec<Sample>,
    clustered: Vec<ClusteredSample>,
    boundary: BoundaryPolygon,
    statistics: Option<FieldStatistics>,
    reported: Option<ReportedStatistics>,
    report: IngestReport,
    opacity: f64,
    status: OverlayStatus,
    map_unavailable: bool,
    last_frame: Option<Frame>,
}

impl FieldOverlay {
    pub fn new(config: OverlayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            opacity: config.opacity,
            config,
            samples: Vec::new(),
            clustered: Vec::new(),
            boundary: BoundaryPolygon::default(),
            statistics: None,
            reported: None,
            report: IngestReport::default(),
            status: OverlayStatus::Loading,
            map_unavailable: false,
            last_frame: None,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn clustered(&self) -> &[ClusteredSample] {
        &self.clustered
    }

    pub fn boundary(&self) -> &BoundaryPolygon {
        &self.boundary
    }

    pub fn statistics(&self) -> Option<&FieldStatistics> {
        self.statistics.as_ref()
    }

    /// Statistics block carried by the last loaded document, if any.
    pub fn reported_statistics(&self) -> Option<&ReportedStatistics> {
        self.reported.as_ref()
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn status(&self) -> &OverlayStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == OverlayStatus::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.status == OverlayStatus::Ready
    }

    /// User-visible message for the error and no-data states.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            OverlayStatus::Error(msg) => Some(msg.as_str()),
            OverlayStatus::NoData => Some(NO_DATA_MESSAGE),
            OverlayStatus::Loading | OverlayStatus::Ready => None,
        }
    }

    /// Most recent successfully composed frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Register the overlay layer with the map.
    pub fn attach<'h, H: OverlayHost + ?Sized>(
        &mut self,
        host: &'h mut H,
    ) -> Result<Attachment<'h, H>> {
        if let Err(e) = host.attach_layer() {
            self.mark_unavailable(&e.to_string());
            return Err(e);
        }
        Ok(Attachment { host })
    }

    /// Replace the sample set from raw records.
    pub fn load_samples(&mut self, records: &[Value]) -> Result<IngestReport> {
        let ingested = ingest_records(records, self.config.value_aliases.as_slice());
        let clustered = cluster_samples(&ingested.samples, self.config.simplification_factor)?;
        let points: Vec<_> = ingested.samples.iter().map(Sample::position).collect();

        self.boundary = convex_hull(&points);
        self.statistics = FieldStatistics::compute(&ingested.samples);
        self.samples = ingested.samples;
        self.clustered = clustered;
        self.report = ingested.report;

        if self.map_unavailable {
            return Ok(self.report);
        }
        self.status = if self.samples.is_empty() {
            info!("{NO_DATA_MESSAGE}");
            OverlayStatus::NoData
        } else {
            info!(
                "field loaded: {} samples, {} clusters, {}-vertex boundary",
                self.samples.len(),
                self.clustered.len(),
                self.boundary.len()
            );
            OverlayStatus::Ready
        };
        Ok(self.report)
    }

    /// Replace the sample set from a field-data JSON document.
    pub fn load_document(&mut self, json: &str) -> Result<IngestReport> {
        let doc = match FieldDocument::from_json(json) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("field data rejected: {e}");
                self.clear_field();
                self.status = OverlayStatus::Error(e.to_string());
                return Err(e);
            }
        };
        self.reported = doc.statistics;
        self.load_samples(&doc.raw_values)
    }

    /// Drop everything derived from the previous load.
    fn clear_field(&mut self) {
        self.samples.clear();
        self.clustered.clear();
        self.boundary = BoundaryPolygon::default();
        self.statistics = None;
        self.reported = None;
        self.report = IngestReport::default();
        self.last_frame = None;
    }

    /// Clamp into the slider range and store.
    ///
    /// The last frame is re-tinted in place, so the returned frame reflects the
    /// new opacity without re-running tessellation.
    pub fn set_opacity(&mut self, value: f64) -> Result<Option<&Frame>> {
        if value.is_nan() {
            return Err(OverlayError::InvalidConfig("opacity is NaN".into()));
        }
        self.opacity = value.clamp(MIN_OPACITY, MAX_OPACITY);
        if let Some(frame) = self.last_frame.as_mut() {
            frame.set_opacity(self.opacity);
        }
        Ok(self.last_frame.as_ref())
    }

    /// The map failed to initialise; nothing will be drawn from now on.
    pub fn mark_unavailable(&mut self, reason: &str) {
        warn!("map unavailable: {reason}");
        self.map_unavailable = true;
        self.status = OverlayStatus::Error(MAP_UNAVAILABLE_MESSAGE.to_string());
    }

    /// Compose a frame for the current viewport.
    ///
    /// Returns `Ok(None)` without touching any state when there is nothing to
    /// draw yet or the viewport is not ready.
    pub fn redraw(&mut self, view: &dyn Viewport) -> Result<Option<&Frame>> {
        if self.map_unavailable || self.samples.is_empty() {
            return Ok(None);
        }

        let inputs = FrameInputs {
            clustered: &self.clustered,
            samples: &self.samples,
            boundary: &self.boundary,
            opacity: self.opacity,
            config: &self.config,
        };
        match compose(&inputs, view) {
            Ok(None) => Ok(None),
            Ok(Some(frame)) => {
                self.status = OverlayStatus::Ready;
                self.last_frame = Some(frame);
                Ok(self.last_frame.as_ref())
            }
            Err(e) => {
                warn!("redraw failed, keeping previous frame: {e}");
                self.status = OverlayStatus::Error(REDRAW_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}
