//! Field boundary extraction via a Graham scan.
//!
//! The scan works in a local planar approximation with `lng` as x and `lat`
//! as y. That holds at single-field scale only; it is not valid near the poles
//! or across the antimeridian.

use serde::Serialize;

use crate::geo::LatLng;

/// Ordered vertices of the field outline, counter-clockwise in (lng, lat).
///
/// Inputs with fewer than three points are kept as-is, and collinear or
/// duplicate inputs may produce a zero-area outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundaryPolygon {
    pub vertices: Vec<LatLng>,
}

impl BoundaryPolygon {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Enough vertices to be stroked and used as a clip region.
    pub fn is_polygon(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Unsigned shoelace area in square degrees.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.lng * b.lat - b.lng * a.lat
            })
            .sum();
        twice.abs() / 2.0
    }

    /// Even-odd ray test. Points exactly on an edge may land either way.
    pub fn contains(&self, p: LatLng) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.lat > p.lat) != (vj.lat > p.lat)
                && p.lng < (vj.lng - vi.lng) * (p.lat - vi.lat) / (vj.lat - vi.lat) + vi.lng
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Convex hull of `points`.
pub fn convex_hull(points: &[LatLng]) -> BoundaryPolygon {
    if points.len() < 3 {
        return BoundaryPolygon { vertices: points.to_vec() };
    }

    let mut pts = points.to_vec();

    // Anchor: lowest lat, then lowest lng.
    let mut anchor_idx = 0;
    for (i, p) in pts.iter().enumerate().skip(1) {
        let a = pts[anchor_idx];
        if p.lat < a.lat || (p.lat == a.lat && p.lng < a.lng) {
            anchor_idx = i;
        }
    }
    pts.swap(0, anchor_idx);
    let anchor = pts[0];

    let mut rest = pts.split_off(1);
    rest.sort_by(|a, b| {
        polar_angle(anchor, *a)
            .total_cmp(&polar_angle(anchor, *b))
            .then_with(|| dist2(anchor, *a).total_cmp(&dist2(anchor, *b)))
    });

    let mut hull = Vec::with_capacity(rest.len() + 1);
    hull.push(anchor);
    hull.push(rest[0]);
    for &c in &rest[1..] {
        while hull.len() >= 2 {
            let a = hull[hull.len() - 2];
            let b = hull[hull.len() - 1];
            if cross(a, b, c) > 0.0 {
                break;
            }
            hull.pop();
        }
        hull.push(c);
    }

    BoundaryPolygon { vertices: hull }
}

fn polar_angle(origin: LatLng, p: LatLng) -> f64 {
    (p.lat - origin.lat).atan2(p.lng - origin.lng)
}

fn dist2(a: LatLng, b: LatLng) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    dx * dx + dy * dy
}

/// z of (b − a) × (c − a); positive for a left turn.
fn cross(a: LatLng, b: LatLng, c: LatLng) -> f64 {
    (b.lng - a.lng) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lng - a.lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ll(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng)
    }

    /// On-or-inside test for a counter-clockwise convex ring.
    fn encloses(hull: &BoundaryPolygon, p: LatLng) -> bool {
        let v = &hull.vertices;
        (0..v.len()).all(|i| cross(v[i], v[(i + 1) % v.len()], p) >= -1e-12)
    }

    #[test]
    fn fewer_than_three_points_are_returned_unchanged() {
        assert!(convex_hull(&[]).is_empty());
        let one = [ll(16.9, 81.1)];
        assert_eq!(convex_hull(&one).vertices, one.to_vec());
        let two = [ll(16.9, 81.1), ll(16.8, 81.0)];
        assert_eq!(convex_hull(&two).vertices, two.to_vec());
    }

    #[test]
    fn square_with_interior_point() {
        let pts = [ll(0.0, 0.0), ll(1.0, 1.0), ll(0.5, 0.5), ll(0.0, 1.0), ll(1.0, 0.0)];
        let hull = convex_hull(&pts);
        assert_eq!(
            hull.vertices,
            vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 1.0), ll(1.0, 0.0)]
        );
        assert!((hull.area() - 1.0).abs() < 1e-12);
        assert!(hull.contains(ll(0.5, 0.5)));
        assert!(!hull.contains(ll(1.5, 0.5)));
    }

    #[test]
    fn anchor_ties_break_on_lowest_lng() {
        let pts = [ll(0.0, 2.0), ll(0.0, 1.0), ll(1.0, 1.5)];
        assert_eq!(convex_hull(&pts).vertices[0], ll(0.0, 1.0));
    }

    #[test]
    fn collinear_points_on_edges_stay_enclosed() {
        let pts = [
            ll(0.0, 0.0),
            ll(0.0, 2.0),
            ll(0.0, 1.0),
            ll(2.0, 2.0),
            ll(1.0, 2.0),
            ll(2.0, 0.0),
            ll(1.0, 1.0),
            ll(2.0, 1.0),
            ll(1.0, 0.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(pts.iter().all(|&p| encloses(&hull, p)));
    }

    #[test]
    fn random_clouds_are_enclosed() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..50 {
            let n = rng.gen_range(3..200);
            let pts: Vec<LatLng> = (0..n)
                .map(|_| ll(16.9 + rng.gen_range(-0.01..0.01), 81.1 + rng.gen_range(-0.01..0.01)))
                .collect();
            let hull = convex_hull(&pts);
            assert!(hull.is_polygon());
            for &p in &pts {
                assert!(encloses(&hull, p), "point {p:?} outside hull");
            }
        }
    }

    #[test]
    fn duplicate_points_give_a_zero_area_outline() {
        let pts = [ll(16.90, 81.10), ll(16.90, 81.10), ll(16.901, 81.101)];
        let hull = convex_hull(&pts);
        assert!(hull.area() < 1e-12);
        assert!(hull.vertices.contains(&ll(16.901, 81.101)));
        assert!(hull.vertices.contains(&ll(16.90, 81.10)));
    }
}
