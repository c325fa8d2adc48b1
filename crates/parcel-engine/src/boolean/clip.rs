//! Robust polygon set operations backed by `geo`'s boolean ops.

use geo::{BooleanOps, LineString, MultiPolygon, Polygon};

use super::{PolygonSetOps, Shape};
use crate::geom::Coord;

/// `PolygonSetOps` implementation on top of `geo::BooleanOps`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoClipper;

fn ring_to_geo(ring: &[Coord]) -> Polygon<f64> {
    let pts: Vec<(f64, f64)> = ring.iter().map(|p| (p.x, p.y)).collect();
    Polygon::new(LineString::from(pts), vec![])
}

fn rings_to_geo(rings: &[Vec<Coord>]) -> MultiPolygon<f64> {
    MultiPolygon::new(
        rings
            .iter()
            .filter(|r| r.len() >= 3)
            .map(|r| ring_to_geo(r))
            .collect(),
    )
}

fn line_to_ring(ls: &LineString<f64>) -> Vec<Coord> {
    ls.coords().map(|c| Coord::new(c.x, c.y)).collect()
}

fn geo_to_shapes(mp: &MultiPolygon<f64>) -> Vec<Shape> {
    mp.iter()
        .map(|p| Shape {
            exterior: line_to_ring(p.exterior()),
            holes: p.interiors().iter().map(line_to_ring).collect(),
        })
        .filter(|s| s.exterior.len() >= 4)
        .collect()
}

impl PolygonSetOps for GeoClipper {
    fn union(&self, rings: &[Vec<Coord>]) -> Vec<Shape> {
        let mut acc = MultiPolygon::<f64>::new(vec![]);
        for ring in rings.iter().filter(|r| r.len() >= 3) {
            let next = MultiPolygon::new(vec![ring_to_geo(ring)]);
            acc = if acc.0.is_empty() { next } else { acc.union(&next) };
        }
        geo_to_shapes(&acc)
    }

    fn intersection(&self, a: &[Coord], b: &[Coord]) -> Vec<Shape> {
        if a.len() < 3 || b.len() < 3 {
            return Vec::new();
        }
        geo_to_shapes(&ring_to_geo(a).intersection(&ring_to_geo(b)))
    }

    fn difference(&self, a: &[Coord], subtract: &[Vec<Coord>]) -> Vec<Shape> {
        if a.len() < 3 {
            return Vec::new();
        }
        let subject = MultiPolygon::new(vec![ring_to_geo(a)]);
        let clip = rings_to_geo(subtract);
        if clip.0.is_empty() {
            return geo_to_shapes(&subject);
        }
        geo_to_shapes(&subject.difference(&clip))
    }
}
