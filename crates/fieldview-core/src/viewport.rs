//! Viewport collaborator contract and a Web-Mercator implementation.
//!
//! The overlay never owns the map. Each redraw reads the current bounds and
//! converts coordinates through [`Viewport::project`]; both may be unavailable
//! while the map is still initialising.

use std::f64::consts::PI;

use crate::error::{OverlayError, Result};
use crate::geo::{GeoBounds, LatLng, PixelPoint};

/// Slippy-map tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;
/// Zoom limits of the dashboard map.
pub const MIN_ZOOM: u32 = 5;
pub const MAX_ZOOM: u32 = 20;

/// The mapping widget as seen by the overlay.
pub trait Viewport {
    /// Current visible bounds, `None` while the map is not ready.
    fn bounds(&self) -> Option<GeoBounds>;

    /// Geographic → pixel conversion, valid while the viewport is stable.
    fn project(&self, at: LatLng) -> Result<PixelPoint>;
}

/// A Web-Mercator view centred on `center` at a (possibly fractional) zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorViewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl MercatorViewport {
    pub fn new(center: LatLng, zoom: f64, width: u32, height: u32) -> Self {
        Self { center, zoom, width, height }
    }

    /// Largest integer zoom in `MIN_ZOOM..=MAX_ZOOM` at which `bounds` fits inside
    /// the view with `padding` pixels on every side, centred on the bounds.
    pub fn fit(bounds: GeoBounds, width: u32, height: u32, padding: f64) -> Self {
        let avail_w = (width as f64 - 2.0 * padding).max(1.0);
        let avail_h = (height as f64 - 2.0 * padding).max(1.0);

        let mut zoom = MIN_ZOOM;
        for z in (MIN_ZOOM..=MAX_ZOOM).rev() {
            let sw = world_pixel(bounds.south_west, z as f64);
            let ne = world_pixel(bounds.north_east, z as f64);
            if (ne.x - sw.x).abs() <= avail_w && (sw.y - ne.y).abs() <= avail_h {
                zoom = z;
                break;
            }
        }

        // Centre in projected space, not on the lat average.
        let sw = world_pixel(bounds.south_west, zoom as f64);
        let ne = world_pixel(bounds.north_east, zoom as f64);
        let mid = PixelPoint::new((sw.x + ne.x) / 2.0, (sw.y + ne.y) / 2.0);
        let center = unproject_world(mid, zoom as f64);

        Self::new(center, zoom as f64, width, height)
    }

    /// Pixel → geographic conversion for this view.
    pub fn unproject(&self, p: PixelPoint) -> LatLng {
        let c = world_pixel(self.center, self.zoom);
        let world = PixelPoint::new(
            c.x + p.x - self.width as f64 / 2.0,
            c.y + p.y - self.height as f64 / 2.0,
        );
        unproject_world(world, self.zoom)
    }
}

impl Viewport for MercatorViewport {
    fn bounds(&self) -> Option<GeoBounds> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let ne = self.unproject(PixelPoint::new(self.width as f64, 0.0));
        let sw = self.unproject(PixelPoint::new(0.0, self.height as f64));
        Some(GeoBounds::new(sw, ne))
    }

    fn project(&self, at: LatLng) -> Result<PixelPoint> {
        if !at.is_finite() {
            return Err(OverlayError::Projection(format!(
                "non-finite coordinate ({}, {})",
                at.lat, at.lng
            )));
        }
        let c = world_pixel(self.center, self.zoom);
        let p = world_pixel(at, self.zoom);
        Ok(PixelPoint::new(
            p.x - c.x + self.width as f64 / 2.0,
            p.y - c.y + self.height as f64 / 2.0,
        ))
    }
}

/// Absolute Web-Mercator pixel position at `zoom`.
fn world_pixel(ll: LatLng, zoom: f64) -> PixelPoint {
    let size = TILE_SIZE * zoom.exp2();
    let x = (ll.lng + 180.0) / 360.0 * size;
    let lat_rad = ll.lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
    PixelPoint::new(x, y)
}

fn unproject_world(p: PixelPoint, zoom: f64) -> LatLng {
    let size = TILE_SIZE * zoom.exp2();
    let lng = p.x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y / size)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn center_projects_to_middle_of_view() {
        let vp = MercatorViewport::new(LatLng::new(16.9, 81.1), 15.0, 800, 600);
        let p = vp.project(vp.center).unwrap();
        assert_abs_diff_eq!(p.x, 400.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 300.0, epsilon = 1e-6);
    }

    #[test]
    fn bounds_corners_project_to_view_corners() {
        let vp = MercatorViewport::new(LatLng::new(16.9, 81.1), 16.0, 640, 480);
        let b = vp.bounds().unwrap();
        let ne = vp.project(b.north_east).unwrap();
        let sw = vp.project(b.south_west).unwrap();
        assert_abs_diff_eq!(ne.x, 640.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ne.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sw.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sw.y, 480.0, epsilon = 1e-6);
    }

    #[test]
    fn unproject_inverts_project() {
        let vp = MercatorViewport::new(LatLng::new(-33.9, 18.4), 12.5, 1024, 768);
        let ll = LatLng::new(-33.88, 18.43);
        let back = vp.unproject(vp.project(ll).unwrap());
        assert_abs_diff_eq!(back.lat, ll.lat, epsilon = 1e-9);
        assert_abs_diff_eq!(back.lng, ll.lng, epsilon = 1e-9);
    }

    #[test]
    fn fit_keeps_bounds_inside_padded_view() {
        let bounds = GeoBounds::new(LatLng::new(16.895, 81.095), LatLng::new(16.905, 81.108));
        let vp = MercatorViewport::fit(bounds, 800, 600, 20.0);
        assert!(vp.zoom >= MIN_ZOOM as f64 && vp.zoom <= MAX_ZOOM as f64);
        for corner in [bounds.south_west, bounds.north_east] {
            let p = vp.project(corner).unwrap();
            assert!(p.x >= 19.999 && p.x <= 780.001, "x out of view: {}", p.x);
            assert!(p.y >= 19.999 && p.y <= 580.001, "y out of view: {}", p.y);
        }
        // One zoom level deeper must no longer fit.
        let deeper = MercatorViewport::new(vp.center, vp.zoom + 1.0, 800, 600);
        let sw = deeper.project(bounds.south_west).unwrap();
        let ne = deeper.project(bounds.north_east).unwrap();
        assert!(ne.x - sw.x > 760.0 || sw.y - ne.y > 560.0);
    }

    #[test]
    fn zero_sized_view_is_not_ready() {
        let vp = MercatorViewport::new(LatLng::new(0.0, 0.0), 10.0, 0, 600);
        assert!(vp.bounds().is_none());
    }

    #[test]
    fn non_finite_coordinate_is_a_projection_error() {
        let vp = MercatorViewport::new(LatLng::new(0.0, 0.0), 10.0, 100, 100);
        assert!(matches!(
            vp.project(LatLng::new(f64::NAN, 0.0)),
            Err(OverlayError::Projection(_))
        ));
    }
}
