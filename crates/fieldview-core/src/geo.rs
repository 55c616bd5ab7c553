//! Geographic and pixel-space coordinate types.
//! Geographic math is f64 throughout; `lng` is the planar x-axis and `lat` the y-axis.

use serde::{Deserialize, Serialize};

/// A point in geographic coordinates (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A point in viewport pixel space (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Axis-aligned geographic bounding box given by its corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self { south_west, north_east }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }
}

/// Axis-aligned pixel rectangle, `min` inclusive, `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub min: PixelPoint,
    pub max: PixelPoint,
}

impl PixelRect {
    /// Rectangle `[0, width] × [0, height]` grown by `margin` on every side.
    pub fn expanded(width: f64, height: f64, margin: f64) -> Self {
        Self {
            min: PixelPoint::new(-margin, -margin),
            max: PixelPoint::new(width + margin, height + margin),
        }
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    /// Corners in ring order.
    pub fn corners(&self) -> Vec<PixelPoint> {
        vec![
            self.min,
            PixelPoint::new(self.max.x, self.min.y),
            self.max,
            PixelPoint::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_points() {
        let pts = [
            LatLng::new(16.90, 81.10),
            LatLng::new(16.95, 81.02),
            LatLng::new(16.85, 81.20),
        ];
        let b = GeoBounds::from_points(pts).unwrap();
        assert_eq!(b.south_west, LatLng::new(16.85, 81.02));
        assert_eq!(b.north_east, LatLng::new(16.95, 81.20));
        assert!(pts.iter().all(|&p| b.contains(p)));
    }

    #[test]
    fn bounds_of_nothing_is_none() {
        assert!(GeoBounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn expanded_rect_includes_margin() {
        let r = PixelRect::expanded(800.0, 600.0, 100.0);
        assert!(r.contains(PixelPoint::new(-100.0, 700.0)));
        assert!(!r.contains(PixelPoint::new(-100.5, 0.0)));
        assert_eq!(r.corners().len(), 4);
    }
}
