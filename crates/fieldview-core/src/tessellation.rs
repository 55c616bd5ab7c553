//! Nearest-seed partition of the viewport in pixel space.
//!
//! Seeds are inserted into a Delaunay triangulation; each cell is the bounding
//! rectangle clipped against the perpendicular bisector of every Delaunay
//! neighbour, which yields the bounded Voronoi cell. Cells carry the index of
//! their owning sample, so no coordinate-keyed lookup is needed afterwards.

use serde::Serialize;
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{OverlayError, Result};
use crate::geo::{PixelPoint, PixelRect};

/// Below this many seeds no cells are produced.
pub const MIN_SEEDS: usize = 3;

/// A projected sample position tagged with the sample's index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub index: usize,
    pub at: PixelPoint,
}

/// Region of the bounds closer to `site` than to any other seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TessellationCell {
    pub sample_index: usize,
    pub site: PixelPoint,
    /// Open ring (first vertex not repeated).
    pub polygon: Vec<PixelPoint>,
}

/// Partition `bounds` among `seeds`.
///
/// Seeds sharing an exact pixel position collapse into the first of them; the
/// later duplicates get no cell. Output is ordered by seed order.
pub fn tessellate(seeds: &[Seed], bounds: PixelRect) -> Result<Vec<TessellationCell>> {
    if seeds.len() < MIN_SEEDS {
        return Ok(Vec::new());
    }

    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    // Triangulation vertex index -> position in `seeds`.
    let mut owner: Vec<Option<usize>> = Vec::with_capacity(seeds.len());

    for (i, seed) in seeds.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(seed.at.x, seed.at.y))
            .map_err(|e| {
                OverlayError::Tessellation(format!(
                    "cannot insert seed ({}, {}): {e:?}",
                    seed.at.x, seed.at.y
                ))
            })?;
        let vi = handle.index();
        if vi >= owner.len() {
            owner.resize(vi + 1, None);
        }
        if owner[vi].is_none() {
            owner[vi] = Some(i);
        }
    }

    // Coincident seeds share a vertex.
    if triangulation.num_vertices() < MIN_SEEDS {
        return Ok(Vec::new());
    }

    // With every seed on one line there are no triangles to walk; fall back to
    // clipping against all other seeds.
    let on_line = triangulation.all_vertices_on_line();

    let mut cells: Vec<(usize, TessellationCell)> = Vec::with_capacity(seeds.len());
    for vertex in triangulation.vertices() {
        let Some(seed_pos) = owner.get(vertex.fix().index()).copied().flatten() else {
            continue;
        };
        let seed = seeds[seed_pos];

        let neighbours: Vec<Point2<f64>> = if on_line {
            triangulation
                .vertices()
                .filter(|other| other.fix() != vertex.fix())
                .map(|other| other.position())
                .collect()
        } else {
            vertex.out_edges().map(|edge| edge.to().position()).collect()
        };

        let mut polygon = bounds.corners();
        for n in neighbours {
            polygon = clip_to_bisector(&polygon, seed.at, PixelPoint::new(n.x, n.y));
            if polygon.is_empty() {
                break;
            }
        }

        if polygon.len() >= 3 {
            cells.push((
                seed_pos,
                TessellationCell { sample_index: seed.index, site: seed.at, polygon },
            ));
        }
    }

    cells.sort_by_key(|(pos, _)| *pos);
    Ok(cells.into_iter().map(|(_, cell)| cell).collect())
}

/// Keep the part of a convex ring that is at least as close to `site` as to `other`.
fn clip_to_bisector(ring: &[PixelPoint], site: PixelPoint, other: PixelPoint) -> Vec<PixelPoint> {
    let nx = other.x - site.x;
    let ny = other.y - site.y;
    let mx = (site.x + other.x) / 2.0;
    let my = (site.y + other.y) / 2.0;
    let side = |p: PixelPoint| (p.x - mx) * nx + (p.y - my) * ny;

    let mut out = Vec::with_capacity(ring.len() + 1);
    for i in 0..ring.len() {
        let cur = ring[i];
        let next = ring[(i + 1) % ring.len()];
        let dc = side(cur);
        let dn = side(next);

        if dc <= 0.0 {
            out.push(cur);
        }
        if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
            let t = dc / (dc - dn);
            out.push(PixelPoint::new(cur.x + (next.x - cur.x) * t, cur.y + (next.y - cur.y) * t));
        }
    }
    out
}
