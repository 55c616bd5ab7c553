//! Frame composition: current state + viewport → draw commands.
//!
//! [`compose`] is a pure function. It never touches a drawing surface; the
//! returned [`Frame`] is executed by [`crate::raster::Raster`] natively or
//! replayed onto an HTML canvas by the wasm binding.
//!
//! Draw order per frame:
//!   1. Clear
//!   2. Stroke the field boundary (≥2 vertices), push it as clip region (≥3)
//!   3. Set the global alpha to the overlay opacity
//!   4. Fill + outline every tessellation cell
//!   5. Pop the clip, which also restores the global alpha
//!   6. Optional raw-sample markers

use serde::Serialize;

use crate::cluster::ClusteredSample;
use crate::color::Color;
use crate::config::{OverlayConfig, MAX_OPACITY, MIN_OPACITY};
use crate::error::Result;
use crate::geo::{PixelPoint, PixelRect};
use crate::hull::BoundaryPolygon;
use crate::sample::Sample;
use crate::tessellation::{tessellate, Seed};
use crate::viewport::Viewport;

pub const MARKER_RADIUS: f64 = 2.0;
pub const MARKER_COLOR: Color = Color::rgba(255, 255, 255, 0.5);

/// One drawing operation in surface pixel coordinates. Paths are closed rings.
///
/// `PushClip` / `PopClip` behave like canvas `save(); clip()` / `restore()`:
/// popping also restores the global alpha in effect at the matching push.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Clear,
    StrokePath { path: Vec<PixelPoint>, color: Color, width: f64 },
    PushClip { path: Vec<PixelPoint> },
    /// Multiplies the alpha of every later paint, like canvas `globalAlpha`.
    SetGlobalAlpha { alpha: f64 },
    FillPath { path: Vec<PixelPoint>, color: Color },
    PopClip,
    FillCircle { center: PixelPoint, radius: f64, color: Color },
}

/// Everything needed to paint one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Viewport pixel position of the surface's top-left corner.
    pub origin: PixelPoint,
    pub width: u32,
    pub height: u32,
    /// Number of tessellation cells painted.
    pub cell_count: usize,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    /// Re-target the opacity of an already composed frame; geometry is untouched.
    pub fn set_opacity(&mut self, opacity: f64) {
        let opacity = opacity.clamp(MIN_OPACITY, MAX_OPACITY);
        for cmd in &mut self.commands {
            if let DrawCommand::SetGlobalAlpha { alpha } = cmd {
                *alpha = opacity;
            }
        }
    }

    /// Global alpha applied to the cells.
    pub fn opacity(&self) -> Option<f64> {
        self.commands.iter().find_map(|cmd| match cmd {
            DrawCommand::SetGlobalAlpha { alpha } => Some(*alpha),
            _ => None,
        })
    }
}

/// Borrowed pipeline state for one redraw.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub clustered: &'a [ClusteredSample],
    /// Raw samples, only read for markers.
    pub samples: &'a [Sample],
    pub boundary: &'a BoundaryPolygon,
    pub opacity: f64,
    pub config: &'a OverlayConfig,
}

/// Build the frame for the current viewport.
///
/// `Ok(None)` means the viewport is not ready (no bounds or an empty surface).
/// Projection and tessellation failures are returned as errors.
pub fn compose(inputs: &FrameInputs<'_>, view: &dyn Viewport) -> Result<Option<Frame>> {
    let Some(bounds) = view.bounds() else {
        return Ok(None);
    };
    let ne = view.project(bounds.north_east)?;
    let sw = view.project(bounds.south_west)?;

    let width = ne.x - sw.x;
    let height = sw.y - ne.y;
    if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
        return Ok(None);
    }
    // Absorb projection round-off so a 640 px view stays 640 px wide.
    let (width, height) = (width.round(), height.round());

    let origin = PixelPoint::new(sw.x, ne.y);
    let to_surface = |p: PixelPoint| p.offset(-origin.x, -origin.y);

    let config = inputs.config;
    let opacity = inputs.opacity.clamp(MIN_OPACITY, MAX_OPACITY);

    let boundary_px = inputs
        .boundary
        .vertices
        .iter()
        .map(|&v| view.project(v).map(to_surface))
        .collect::<Result<Vec<_>>>()?;

    // Seeds outside the margin never reach the triangulation.
    let tess_bounds = PixelRect::expanded(width, height, config.viewport_margin);
    let mut seeds = Vec::with_capacity(inputs.clustered.len());
    for (index, c) in inputs.clustered.iter().enumerate() {
        let at = to_surface(view.project(c.position())?);
        if tess_bounds.contains(at) {
            seeds.push(Seed { index, at });
        }
    }
    let cells = tessellate(&seeds, tess_bounds)?;

    let mut commands = Vec::with_capacity(cells.len() * 2 + 4);
    commands.push(DrawCommand::Clear);

    // A two-vertex outline is still drawn; only a real polygon can clip.
    if boundary_px.len() >= 2 {
        commands.push(DrawCommand::StrokePath {
            path: boundary_px.clone(),
            color: config.boundary_style.color,
            width: config.boundary_style.width,
        });
    }
    let clipped = boundary_px.len() >= 3;
    if clipped {
        commands.push(DrawCommand::PushClip { path: boundary_px });
    }

    commands.push(DrawCommand::SetGlobalAlpha { alpha: opacity });
    for cell in &cells {
        let sample = &inputs.clustered[cell.sample_index];
        commands.push(DrawCommand::FillPath {
            path: cell.polygon.clone(),
            color: config.color_scale.resolve(sample.value),
        });
        commands.push(DrawCommand::StrokePath {
            path: cell.polygon.clone(),
            color: config.separator_style.color,
            width: config.separator_style.width,
        });
    }

    if clipped {
        commands.push(DrawCommand::PopClip);
    }

    if config.show_sample_markers {
        let visible = PixelRect::expanded(width, height, 0.0);
        for s in inputs.samples {
            let center = to_surface(view.project(s.position())?);
            if visible.contains(center) {
                commands.push(DrawCommand::FillCircle {
                    center,
                    radius: MARKER_RADIUS,
                    color: MARKER_COLOR,
                });
            }
        }
    }

    Ok(Some(Frame {
        origin,
        width: width as u32,
        height: height as u32,
        cell_count: cells.len(),
        commands,
    }))
}
