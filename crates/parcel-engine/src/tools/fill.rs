//! Fill from reference polygons.
//!
//! `Boundary` mode collects an adjacent group of reference polygons (plus the
//! existing boundary, pinned) and merges them into a new boundary on
//! `confirm`. `Parcels` mode stamps the clicked reference polygon straight
//! into the parcel collection.

use serde_json::Value;
use tracing::{debug, info};

use crate::boolean::{clip_to_available, merge_rings};
use crate::error::EditError;
use crate::events::EditorEvent;
use crate::geom::{are_polygons_adjacent, are_polygons_contiguous, ring_area, Coord};
use crate::model::{Boundary, FeatureId, Metadata};
use crate::reference::RefPolygon;

use super::{Ctx, FillMode};

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillClick {
    /// New parcel stamped (parcels mode).
    Stamped(FeatureId),
    /// Polygon joined the selection.
    Selected,
    /// Polygon left the selection.
    Deselected,
    /// Not adjacent to the group; the selection restarted with this polygon.
    Restarted,
}

#[derive(Clone, Debug, Default)]
pub struct FillTool {
    mode: Option<FillMode>,
    selection: Vec<RefPolygon>,
    pinned: Option<Vec<Coord>>,
    hover: Option<RefPolygon>,
}

impl FillTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<FillMode> {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn selection(&self) -> &[RefPolygon] {
        &self.selection
    }

    pub fn pinned(&self) -> Option<&[Coord]> {
        self.pinned.as_deref()
    }

    pub fn hover(&self) -> Option<&RefPolygon> {
        self.hover.as_ref()
    }

    pub fn selected_area(&self) -> f64 {
        self.selection.iter().map(RefPolygon::area).sum()
    }

    pub fn start(&mut self, ctx: &mut Ctx, mode: FillMode) -> Result<(), EditError> {
        let boundary = ctx.doc.boundary_ring().map(<[Coord]>::to_vec);
        if mode == FillMode::Parcels && boundary.is_none() {
            return Err(EditError::NoBoundary);
        }
        *self = Self {
            mode: Some(mode),
            pinned: boundary.filter(|_| mode == FillMode::Boundary),
            ..Self::default()
        };
        debug!(?mode, pinned = self.pinned.is_some(), "fill started");
        ctx.emit(EditorEvent::FillStarted { mode });
        Ok(())
    }

    /// Track the reference polygon under the pointer.
    pub fn hover_at(&mut self, ctx: &Ctx, raw: Coord) -> Option<&RefPolygon> {
        if self.mode.is_none() {
            return None;
        }
        self.hover = ctx.refs.polygon_at(raw, &ctx.cfg.fill_layers, ctx.cfg.eps);
        self.hover.as_ref()
    }

    pub fn click(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<FillClick, EditError> {
        let mode = self.mode.ok_or(EditError::NotActive("fill"))?;
        let candidate = ctx
            .refs
            .polygon_at(raw, &ctx.cfg.fill_layers, ctx.cfg.eps)
            .ok_or(EditError::NoReferenceArea)?;
        match mode {
            FillMode::Parcels => self.stamp(ctx, candidate),
            FillMode::Boundary => Ok(self.toggle(ctx, candidate)),
        }
    }

    fn stamp(&mut self, ctx: &mut Ctx, candidate: RefPolygon) -> Result<FillClick, EditError> {
        let ring = match ctx.check_parcel_ring(&candidate.ring, None) {
            Ok(ring) => ring,
            Err(EditError::OutsideBoundary | EditError::OverlapsParcel(_))
                if ctx.cfg.clip_fill_to_available =>
            {
                let boundary = ctx.doc.boundary_ring().ok_or(EditError::NoBoundary)?;
                let clipped = clip_to_available(
                    ctx.ops,
                    &candidate.ring,
                    boundary,
                    &ctx.doc.parcel_rings_except(None),
                    ctx.cfg.area_threshold(),
                    ctx.geom(),
                )
                .ok_or(EditError::OutsideBoundary)?;
                debug!(
                    from = candidate.area(),
                    to = ring_area(&clipped),
                    "fill candidate clipped to free space"
                );
                ctx.check_parcel_ring(&clipped, None)?
            }
            Err(err) => return Err(err),
        };
        let mut metadata = Metadata::new();
        metadata.insert("source_layer".into(), Value::from(candidate.layer.clone()));
        metadata.insert("source_id".into(), Value::from(candidate.feature.0));
        let (_, id) = ctx.add_parcel(ring, metadata);
        Ok(FillClick::Stamped(id))
    }

    fn toggle(&mut self, ctx: &mut Ctx, candidate: RefPolygon) -> FillClick {
        let cfg = ctx.geom();
        let existing = self.selection.iter().position(|s| s.same_source(&candidate));
        let outcome = if let Some(pos) = existing {
            self.selection.remove(pos);
            FillClick::Deselected
        } else {
            let grouped = !self.selection.is_empty() || self.pinned.is_some();
            let touches = self
                .selection
                .iter()
                .map(|s| s.ring.as_slice())
                .chain(self.pinned.as_deref())
                .any(|r| are_polygons_adjacent(r, &candidate.ring, cfg));
            let outcome = if grouped && !touches {
                debug!(feature = %candidate.feature, "not adjacent; selection restarted");
                self.selection.clear();
                FillClick::Restarted
            } else {
                FillClick::Selected
            };
            self.selection.push(candidate);
            outcome
        };
        ctx.emit(EditorEvent::FillSelectionChanged {
            count: self.selection.len(),
            total_area_sqm: self.selected_area(),
        });
        outcome
    }

    /// Merge the selection (and pinned boundary) into the new boundary.
    /// On failure the selection stays for another attempt.
    pub fn confirm(&mut self, ctx: &mut Ctx) -> Result<f64, EditError> {
        match self.mode {
            None => return Err(EditError::NotActive("fill")),
            Some(FillMode::Parcels) => return Err(EditError::WrongMode("parcels")),
            Some(FillMode::Boundary) => {}
        }
        if self.selection.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let cfg = ctx.geom();
        let mut rings: Vec<Vec<Coord>> = self.selection.iter().map(|s| s.ring.clone()).collect();
        if let Some(pinned) = &self.pinned {
            rings.push(pinned.clone());
        }
        if rings.len() > 1 && !are_polygons_contiguous(&rings, cfg) {
            return Err(EditError::NotContiguous);
        }
        let merged = merge_rings(&rings, cfg, ctx.ops)?;
        ctx.check_boundary_ring(&merged)?;
        let area_sqm = ring_area(&merged);
        let metadata = ctx
            .doc
            .boundary
            .take()
            .map(|b| b.metadata)
            .unwrap_or_default();
        ctx.doc.boundary = Some(Boundary {
            ring: merged,
            metadata,
        });
        info!(area_sqm, parts = rings.len(), "boundary filled");
        *self = Self::default();
        ctx.emit(EditorEvent::BoundaryChanged { area_sqm });
        ctx.emit(EditorEvent::FillConfirmed { area_sqm });
        Ok(area_sqm)
    }

    pub fn cancel(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if self.mode.is_none() {
            return Err(EditError::NotActive("fill"));
        }
        *self = Self::default();
        ctx.emit(EditorEvent::FillCancelled);
        Ok(())
    }
}
