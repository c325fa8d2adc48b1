//! Basic planar types and tolerances shared by the predicates.
//!
//! - `GeomCfg`: centralizes the distance tolerance `eps` and the derived
//!   adjacency/extent slack (`10·eps`).
//! - `Extent`: axis-aligned bounding box with tolerance-aware comparisons.
//! - `Affine2`: invertible planar map used to move coordinates between the
//!   working CRS and an export CRS.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// A point in the working CRS (projected meters).
pub type Coord = Vector2<f64>;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeomCfg {
    /// Distance below which two points or a point and a segment are "equal".
    pub eps: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self { eps: 1e-3 }
    }
}

impl GeomCfg {
    #[inline]
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// Slack used for adjacency, coincidence and extent checks.
    #[inline]
    pub fn slack(&self) -> f64 {
        10.0 * self.eps
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: Coord,
    pub max: Coord,
}

impl Extent {
    #[inline]
    pub fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// Bounding box of a point set; `None` when empty.
    pub fn from_points(points: &[Coord]) -> Option<Self> {
        let first = *points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &points[1..] {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some(Self { min, max })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Coord {
        (self.min + self.max) * 0.5
    }

    /// Grow by `d` on every side.
    #[inline]
    pub fn buffered(&self, d: f64) -> Self {
        let v = Vector2::new(d, d);
        Self {
            min: self.min - v,
            max: self.max + v,
        }
    }

    #[inline]
    pub fn contains_point(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// `other` lies inside `self`.
    #[inline]
    pub fn contains_extent(&self, other: &Extent) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    #[inline]
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// True if `self` sticks out of `outer` by more than `tol` on any side.
    #[inline]
    pub fn exceeds(&self, outer: &Extent, tol: f64) -> bool {
        self.min.x < outer.min.x - tol
            || self.min.y < outer.min.y - tol
            || self.max.x > outer.max.x + tol
            || self.max.y > outer.max.y + tol
    }
}

/// Planar affine map: `x ↦ M x + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    #[inline]
    pub fn identity() -> Self {
        Self {
            m: Matrix2::identity(),
            t: Vector2::zeros(),
        }
    }

    /// Uniform scale followed by a translation.
    #[inline]
    pub fn scale_translate(scale: f64, t: Vector2<f64>) -> Self {
        Self {
            m: Matrix2::identity() * scale,
            t,
        }
    }

    #[inline]
    pub fn apply(&self, p: Coord) -> Coord {
        self.m * p + self.t
    }

    /// Inverse map if `m` is invertible.
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|minv| Self {
            m: minv,
            t: -minv * self.t,
        })
    }

    /// Composition `self ∘ other`.
    #[inline]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            m: self.m * other.m,
            t: self.m * other.t + self.t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{matrix, vector};

    #[test]
    fn extent_exceeds_respects_tolerance() {
        let outer = Extent::new(vector![0.0, 0.0], vector![10.0, 10.0]);
        let inner = Extent::new(vector![-0.005, 1.0], vector![9.0, 9.0]);
        assert!(!inner.exceeds(&outer, 0.01));
        assert!(inner.exceeds(&outer, 0.001));
    }

    #[test]
    fn affine_inverse_round_trips_a_point() {
        let f = Affine2 {
            m: matrix![2.0, 0.5; 0.0, 1.5],
            t: vector![100.0, -40.0],
        };
        let inv = f.inverse().unwrap();
        let p = vector![3.0, 7.0];
        assert!((inv.apply(f.apply(p)) - p).norm() < 1e-12);
        assert!((f.compose(&inv).apply(p) - p).norm() < 1e-12);
    }

    #[test]
    fn singular_affine_has_no_inverse() {
        let f = Affine2 {
            m: matrix![1.0, 2.0; 2.0, 4.0],
            t: vector![0.0, 0.0],
        };
        assert!(f.inverse().is_none());
    }
}
