//! Map surface capability: projection between map coordinates and screen pixels.
//!
//! Rendering and input plumbing live outside the engine; tools only need the
//! current resolution and the coordinate ↔ pixel mapping.

use nalgebra::Vector2;

use crate::geom::{Coord, Extent};

/// Screen position in pixels (y grows downwards).
pub type Pixel = Vector2<f64>;

/// Ground resolution (m/px) at zoom 0 for 256 px web tiles.
const RESOLUTION_AT_ZOOM_0: f64 = 156_543.033_928_041;

pub trait MapSurface {
    /// Map units per pixel.
    fn resolution(&self) -> f64;
    fn to_pixel(&self, c: Coord) -> Pixel;
    fn to_coord(&self, px: Pixel) -> Coord;
    /// Visible map extent.
    fn view_extent(&self) -> Extent;

    /// Tile zoom level matching the current resolution.
    fn zoom(&self) -> f64 {
        (RESOLUTION_AT_ZOOM_0 / self.resolution()).log2()
    }

    /// Screen distance between two map coordinates.
    fn pixel_distance(&self, a: Coord, b: Coord) -> f64 {
        (self.to_pixel(a) - self.to_pixel(b)).norm()
    }
}

/// A fixed orthographic view: centre, resolution and viewport size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub center: Coord,
    pub resolution: f64,
    pub size_px: Vector2<f64>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            center: Coord::zeros(),
            resolution: 1.0,
            size_px: Vector2::new(1024.0, 768.0),
        }
    }
}

impl ViewTransform {
    pub fn new(center: Coord, resolution: f64, size_px: Vector2<f64>) -> Self {
        Self {
            center,
            resolution,
            size_px,
        }
    }

    /// View centred on `extent` with `margin_px` padding on each side.
    pub fn fit(extent: &Extent, size_px: Vector2<f64>, margin_px: f64) -> Self {
        let usable = (size_px - Vector2::new(2.0 * margin_px, 2.0 * margin_px))
            .sup(&Vector2::new(1.0, 1.0));
        let res = (extent.width() / usable.x)
            .max(extent.height() / usable.y)
            .max(1e-6);
        Self::new(extent.center(), res, size_px)
    }
}

impl MapSurface for ViewTransform {
    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn to_pixel(&self, c: Coord) -> Pixel {
        let d = (c - self.center) / self.resolution;
        Pixel::new(self.size_px.x * 0.5 + d.x, self.size_px.y * 0.5 - d.y)
    }

    fn to_coord(&self, px: Pixel) -> Coord {
        let dx = (px.x - self.size_px.x * 0.5) * self.resolution;
        let dy = (self.size_px.y * 0.5 - px.y) * self.resolution;
        self.center + Coord::new(dx, dy)
    }

    fn view_extent(&self) -> Extent {
        let half = self.size_px * (0.5 * self.resolution);
        Extent::new(self.center - half, self.center + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn pixel_round_trip_and_distance() {
        let view = ViewTransform::new(vector![500.0, 500.0], 0.5, vector![800.0, 600.0]);
        let c = vector![510.0, 490.0];
        let px = view.to_pixel(c);
        assert_eq!(px, vector![420.0, 320.0]);
        assert!((view.to_coord(px) - c).norm() < 1e-12);
        assert!((view.pixel_distance(c, vector![511.0, 490.0]) - 2.0).abs() < 1e-12);
        let e = view.view_extent();
        assert_eq!(e.min, vector![300.0, 350.0]);
    }

    #[test]
    fn fit_covers_extent() {
        let e = Extent::new(vector![0.0, 0.0], vector![100.0, 50.0]);
        let view = ViewTransform::fit(&e, vector![220.0, 220.0], 10.0);
        assert!((view.resolution - 0.5).abs() < 1e-12);
        assert!(view.view_extent().contains_extent(&e));
        assert!(view.zoom() > 17.0);
    }
}
