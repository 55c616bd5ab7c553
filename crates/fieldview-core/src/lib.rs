//! Field vegetation overlay: turns geolocated index readings into a clipped,
//! colour-coded nearest-sample tessellation over a map viewport.
//!
//! Pipeline: [`ingest`] → [`cluster`] → [`hull`] → [`tessellation`] →
//! [`compositor`]. [`overlay::FieldOverlay`] holds the state between redraws.

pub mod cluster;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geo;
pub mod hull;
pub mod ingest;
pub mod overlay;
pub mod raster;
pub mod sample;
pub mod stats;
pub mod tessellation;
pub mod viewport;

pub use compositor::{compose, DrawCommand, Frame, FrameInputs};
pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use geo::{GeoBounds, LatLng, PixelPoint};
pub use overlay::{Attachment, FieldOverlay, OverlayHost, OverlayStatus};
pub use raster::Raster;
pub use viewport::{MercatorViewport, Viewport};
