//! Interactive editing tools.
//!
//! Each tool is a small state machine driven through its public methods with
//! a borrowed `Ctx` (document, configuration, map surface, snapping,
//! reference index, event sink). Tools never hold references between calls;
//! the `Editor` wires them together and enforces that only one is active.
//!
//! - `draw`: boundary / parcel polygon drawing and vertex editing.
//! - `fill`: build the boundary from reference polygons, or stamp them as parcels.
//! - `slice`: split the boundary or a parcel with a two-point cut.
//! - `line`: hedgerow / watercourse polylines.
//! - `remove`: delete the parcel or linear feature under the pointer.

mod draw;
mod fill;
mod line;
mod remove;
mod slice;

pub use draw::{DrawState, DrawTool, EditTarget, Ghost};
pub use fill::{FillClick, FillTool};
pub use line::LineTool;
pub use remove::{RemoveTool, Removed};
pub use slice::{split_ring, SliceSource, SliceTool};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::boolean::{overlaps_significantly, PolygonSetOps};
use crate::config::EditorCfg;
use crate::error::EditError;
use crate::events::{EditorEvent, EventBus};
use crate::geom::{
    correct_geometry_to_boundary, do_polygons_overlap, is_closed, is_line_within_boundary,
    is_polygon_within_boundary, is_ring_self_intersecting, open_ring, Coord, GeomCfg,
    MIN_CLOSED_RING_LEN,
};
use crate::model::{Document, FeatureId, Metadata, Parcel};
use crate::reference::ReferenceIndex;
use crate::snap::{SnapQuery, SnapResolver, SnapResult};
use crate::surface::MapSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    Boundary,
    Parcel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Boundary,
    Parcels,
}

/// Which tool currently owns pointer input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTool {
    #[default]
    None,
    Draw,
    Fill,
    Slice,
    Remove,
    Line,
}

/// Everything a tool may touch during one call.
pub struct Ctx<'a> {
    pub doc: &'a mut Document,
    pub cfg: &'a EditorCfg,
    pub surface: &'a dyn MapSurface,
    pub snap: &'a SnapResolver,
    pub refs: &'a ReferenceIndex,
    pub ops: &'a dyn PolygonSetOps,
    pub events: &'a mut EventBus,
}

impl Ctx<'_> {
    pub fn geom(&self) -> GeomCfg {
        self.cfg.geom()
    }

    pub fn emit(&mut self, event: EditorEvent) {
        self.events.emit(event);
    }

    pub fn snap(&self, raw: Coord, exclude_parcel: Option<usize>, clamp: bool) -> SnapResult {
        let q = SnapQuery {
            resolution: self.surface.resolution(),
            exclude_parcel,
            clamp_to_boundary: clamp,
        };
        self.snap.resolve(raw, &q, self.doc, self.refs)
    }

    pub fn pixel_distance(&self, a: Coord, b: Coord) -> f64 {
        self.surface.pixel_distance(a, b)
    }

    /// First parcel (other than `skip`) that `ring` overlaps by more than the negligible area.
    pub fn first_overlap(&self, ring: &[Coord], skip: Option<usize>) -> Option<FeatureId> {
        let cfg = self.geom();
        let threshold = self.cfg.area_threshold();
        self.doc
            .parcels
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .find(|(_, p)| {
                do_polygons_overlap(ring, &p.ring, cfg)
                    && overlaps_significantly(self.ops, ring, &p.ring, threshold)
            })
            .map(|(_, p)| p.id)
    }

    /// Boundary-correct a candidate parcel ring and check every parcel invariant.
    /// Returns the corrected ring.
    pub fn check_parcel_ring(
        &self,
        ring: &[Coord],
        skip: Option<usize>,
    ) -> Result<Vec<Coord>, EditError> {
        let cfg = self.geom();
        let boundary = self.doc.boundary_ring().ok_or(EditError::NoBoundary)?;
        let corrected = correct_geometry_to_boundary(ring, boundary, cfg);
        check_simple_ring(&corrected, cfg)?;
        if !is_polygon_within_boundary(&corrected, boundary, cfg) {
            return Err(EditError::OutsideBoundary);
        }
        if let Some(id) = self.first_overlap(&corrected, skip) {
            return Err(EditError::OverlapsParcel(id));
        }
        Ok(corrected)
    }

    /// Check a replacement boundary ring: simple, and still containing every
    /// parcel and linear feature.
    pub fn check_boundary_ring(&self, ring: &[Coord]) -> Result<(), EditError> {
        let cfg = self.geom();
        check_simple_ring(ring, cfg)?;
        let parcels_inside = self
            .doc
            .parcels
            .iter()
            .all(|p| is_polygon_within_boundary(&p.ring, ring, cfg));
        let lines_inside = self
            .doc
            .hedgerows
            .iter()
            .chain(self.doc.watercourses.iter())
            .all(|f| is_line_within_boundary(&f.coordinates, ring, cfg));
        if !(parcels_inside && lines_inside) {
            return Err(EditError::OutsideBoundary);
        }
        Ok(())
    }

    pub fn add_parcel(&mut self, ring: Vec<Coord>, metadata: Metadata) -> (usize, FeatureId) {
        let index = self
            .doc
            .push_parcel(ring, metadata, self.cfg.parcel_palette_size);
        let p = &self.doc.parcels[index];
        let (id, area_sqm) = (p.id, p.area());
        info!(%id, area_sqm, "parcel added");
        self.emit(EditorEvent::ParcelAdded { index, id, area_sqm });
        (index, id)
    }

    pub fn remove_parcel(&mut self, index: usize) -> Result<Parcel, EditError> {
        if index >= self.doc.parcels.len() {
            return Err(EditError::NoSuchParcel(index));
        }
        let p = self.doc.parcels.remove(index);
        info!(id = %p.id, "parcel removed");
        self.emit(EditorEvent::ParcelRemoved {
            index,
            id: p.id,
            area_sqm: p.area(),
        });
        Ok(p)
    }
}

/// Closed, at least four coordinates, not self-intersecting.
pub fn check_simple_ring(ring: &[Coord], cfg: GeomCfg) -> Result<(), EditError> {
    if ring.len() < MIN_CLOSED_RING_LEN || !is_closed(ring, cfg.eps) {
        return Err(EditError::TooFewPoints {
            need: MIN_CLOSED_RING_LEN,
            got: ring.len(),
        });
    }
    if is_ring_self_intersecting(ring, cfg) {
        return Err(EditError::SelfIntersecting);
    }
    Ok(())
}

/// Move vertex `i` of a closed ring, mirroring the first and closing coordinates.
pub fn set_ring_vertex(ring: &mut [Coord], i: usize, c: Coord) {
    let n = ring.len();
    if n == 0 {
        return;
    }
    let last = n - 1;
    let i = if i == last { 0 } else { i };
    if i >= n {
        return;
    }
    ring[i] = c;
    if i == 0 {
        ring[last] = c;
    }
}

/// Index of the open-ring vertex within `max_px` pixels of `p`, if any (closest wins).
pub fn vertex_under(
    ring: &[Coord],
    p: Coord,
    max_px: f64,
    surface: &dyn MapSurface,
    eps: f64,
) -> Option<usize> {
    open_ring(ring, eps)
        .iter()
        .enumerate()
        .map(|(i, &v)| (i, surface.pixel_distance(v, p)))
        .filter(|(_, d)| *d <= max_px)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests;
