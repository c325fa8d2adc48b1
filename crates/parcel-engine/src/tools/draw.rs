//! Polygon drawing and vertex editing.
//!
//! States: `Idle → Drawing → Complete`, `Editing` entered from `Idle` or
//! `Complete` for an existing boundary or parcel. Parcel drawing returns to
//! `Idle` after every closed parcel.

use tracing::{debug, info};

use crate::error::EditError;
use crate::events::EditorEvent;
use crate::geom::{
    closed_ring, closest_point_on_ring, open_ring, points_equal, ring_area, Coord,
};
use crate::model::{Boundary, FeatureId};

use super::{check_simple_ring, set_ring_vertex, vertex_under, Ctx, DrawMode};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
    Complete,
    Editing,
}

/// Ring being edited in `Editing` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditTarget {
    Boundary,
    Parcel(FeatureId),
}

/// Insertion indicator on the nearest edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ghost {
    pub coord: Coord,
    pub edge: usize,
}

#[derive(Clone, Debug)]
struct Drag {
    vertex: usize,
    original: Vec<Coord>,
}

#[derive(Clone, Debug, Default)]
pub struct DrawTool {
    state: DrawState,
    mode: Option<DrawMode>,
    points: Vec<Coord>,
    cursor: Option<Coord>,
    closable: bool,
    target: Option<EditTarget>,
    ghost: Option<Ghost>,
    drag: Option<Drag>,
}

impl DrawTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn mode(&self) -> Option<DrawMode> {
        self.mode
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn is_closable(&self) -> bool {
        self.closable
    }

    pub fn ghost(&self) -> Option<Ghost> {
        self.ghost
    }

    pub fn edit_target(&self) -> Option<EditTarget> {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Transient geometry to render: a line for two points, a ring for three or more.
    pub fn preview(&self) -> Option<Vec<Coord>> {
        if self.state != DrawState::Drawing {
            return None;
        }
        let mut pts = self.points.clone();
        pts.extend(self.cursor);
        match pts.len() {
            0 | 1 => None,
            2 => Some(pts),
            _ => {
                let first = pts[0];
                pts.push(first);
                Some(pts)
            }
        }
    }

    pub fn start(&mut self, ctx: &mut Ctx, mode: DrawMode) -> Result<(), EditError> {
        if self.state == DrawState::Drawing {
            return Err(EditError::AlreadyDrawing);
        }
        match mode {
            DrawMode::Parcel if ctx.doc.boundary.is_none() => return Err(EditError::NoBoundary),
            DrawMode::Boundary if ctx.doc.boundary.is_some() => {
                return Err(EditError::BoundaryExists)
            }
            _ => {}
        }
        self.reset();
        self.state = DrawState::Drawing;
        self.mode = Some(mode);
        debug!(?mode, "drawing started");
        ctx.emit(EditorEvent::DrawingStarted { mode });
        Ok(())
    }

    /// Pointer moved to `raw` (map coordinates).
    pub fn pointer_move(&mut self, ctx: &mut Ctx, raw: Coord) {
        match self.state {
            DrawState::Drawing => self.track_cursor(ctx, raw),
            DrawState::Editing if self.drag.is_some() => self.drag_to(ctx, raw),
            DrawState::Editing => self.update_ghost(ctx, raw),
            _ => {}
        }
    }

    fn track_cursor(&mut self, ctx: &mut Ctx, raw: Coord) {
        let snapped = ctx.snap(raw, None, self.mode == Some(DrawMode::Parcel));
        self.cursor = Some(snapped.coord);
        self.closable = self.points.len() >= 3
            && ctx.pixel_distance(raw, self.points[0]) <= ctx.cfg.close_tolerance_px;
        if let Some(preview) = self.preview().filter(|p| p.len() >= 4) {
            ctx.emit(EditorEvent::DrawingAreaChanged {
                area_sqm: ring_area(&preview),
            });
        }
    }

    /// Click while drawing: close when the pointer is over the first vertex, else add a point.
    pub fn click(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<(), EditError> {
        if self.state != DrawState::Drawing {
            return Err(EditError::NotActive("drawing"));
        }
        let near_first = self.points.len() >= 3
            && ctx.pixel_distance(raw, self.points[0]) <= ctx.cfg.close_tolerance_px;
        if near_first {
            self.closable = true;
            return self.close(ctx);
        }
        self.add_point(ctx, raw)
    }

    /// Append the snapped coordinate (pointer click or keyboard confirm).
    pub fn add_point(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<(), EditError> {
        if self.state != DrawState::Drawing {
            return Err(EditError::NotActive("drawing"));
        }
        let snapped = ctx.snap(raw, None, self.mode == Some(DrawMode::Parcel));
        let eps = ctx.cfg.eps;
        if self
            .points
            .last()
            .is_some_and(|&last| points_equal(last, snapped.coord, eps))
        {
            return Ok(());
        }
        self.points.push(snapped.coord);
        self.cursor = None;
        debug!(n = self.points.len(), source = ?snapped.source, "vertex placed");
        Ok(())
    }

    pub fn undo_last_point(&mut self) -> Result<(), EditError> {
        if self.state != DrawState::Drawing {
            return Err(EditError::NotActive("drawing"));
        }
        self.points.pop();
        self.closable = false;
        Ok(())
    }

    /// Close the ring. Validation failures keep the drawing for correction.
    pub fn close(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if self.state != DrawState::Drawing {
            return Err(EditError::NotActive("drawing"));
        }
        if self.points.len() < 3 {
            return Err(EditError::TooFewPoints {
                need: 3,
                got: self.points.len(),
            });
        }
        let mode = self.mode.unwrap_or(DrawMode::Boundary);
        let ring = closed_ring(&self.points, ctx.cfg.eps);
        match mode {
            DrawMode::Boundary => {
                check_simple_ring(&ring, ctx.geom())?;
                let area_sqm = ring_area(&ring);
                ctx.doc.boundary = Some(Boundary::new(ring));
                info!(area_sqm, "boundary drawn");
                self.points.clear();
                self.cursor = None;
                self.closable = false;
                self.state = DrawState::Complete;
                ctx.emit(EditorEvent::BoundaryChanged { area_sqm });
                ctx.emit(EditorEvent::DrawingCompleted { mode, area_sqm });
            }
            DrawMode::Parcel => {
                let ring = ctx.check_parcel_ring(&ring, None)?;
                let area_sqm = ring_area(&ring);
                ctx.add_parcel(ring, Default::default());
                self.reset();
                ctx.emit(EditorEvent::DrawingCompleted { mode, area_sqm });
            }
        }
        Ok(())
    }

    pub fn cancel(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if self.state != DrawState::Drawing {
            return Err(EditError::NotActive("drawing"));
        }
        self.reset();
        ctx.emit(EditorEvent::DrawingCancelled);
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    // ---- editing -------------------------------------------------------

    pub fn begin_edit(&mut self, ctx: &mut Ctx, target: EditTarget) -> Result<(), EditError> {
        if self.state == DrawState::Drawing {
            return Err(EditError::AlreadyDrawing);
        }
        target_ring(ctx, target)?;
        self.reset();
        self.state = DrawState::Editing;
        self.target = Some(target);
        debug!(?target, "editing started");
        Ok(())
    }

    /// Leave editing; an unfinished drag is reverted.
    pub fn end_edit(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if self.state != DrawState::Editing {
            return Err(EditError::NotActive("editing"));
        }
        if let (Some(drag), Some(target)) = (self.drag.take(), self.target) {
            if let Ok(ring) = target_ring_mut(ctx, target) {
                *ring = drag.original;
            }
        }
        let boundary_target = self.target == Some(EditTarget::Boundary);
        self.reset();
        if boundary_target {
            self.state = DrawState::Complete;
        }
        Ok(())
    }

    fn update_ghost(&mut self, ctx: &Ctx, raw: Coord) {
        self.ghost = None;
        let Some(target) = self.target else { return };
        let Ok(ring) = target_ring(ctx, target) else { return };
        let eps = ctx.cfg.eps;
        if vertex_under(ring, raw, ctx.cfg.vertex_hit_px, ctx.surface, eps).is_some() {
            return;
        }
        if let Some((c, edge, _)) = closest_point_on_ring(raw, ring, eps) {
            if ctx.pixel_distance(c, raw) <= ctx.cfg.ghost_max_px {
                self.ghost = Some(Ghost { coord: c, edge });
            }
        }
    }

    /// Press: grab the vertex under the pointer, or insert one at the ghost and grab it.
    pub fn pointer_down(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<(), EditError> {
        if self.state != DrawState::Editing {
            return Err(EditError::NotActive("editing"));
        }
        let target = self.target.ok_or(EditError::NotActive("editing"))?;
        let (hit_px, eps) = (ctx.cfg.vertex_hit_px, ctx.cfg.eps);
        let ring = target_ring(ctx, target)?;
        if let Some(vertex) = vertex_under(ring, raw, hit_px, ctx.surface, eps) {
            self.drag = Some(Drag {
                vertex,
                original: ring.to_vec(),
            });
            return Ok(());
        }
        self.update_ghost(ctx, raw);
        let Some(ghost) = self.ghost.take() else {
            return Ok(());
        };
        let original = ring.to_vec();
        let mut open = open_ring(&original, eps).to_vec();
        let vertex = ghost.edge + 1;
        open.insert(vertex, ghost.coord);
        let updated = closed_ring(&open, eps);
        let area_sqm = ring_area(&updated);
        *target_ring_mut(ctx, target)? = updated;
        debug!(vertex, "vertex inserted");
        ctx.emit(EditorEvent::DrawingAreaChanged { area_sqm });
        self.drag = Some(Drag { vertex, original });
        Ok(())
    }

    fn drag_to(&mut self, ctx: &mut Ctx, raw: Coord) {
        let (Some(drag), Some(target)) = (&self.drag, self.target) else {
            return;
        };
        // boundary vertices follow the pointer unsnapped
        let coord = match target {
            EditTarget::Boundary => raw,
            EditTarget::Parcel(id) => ctx.snap(raw, ctx.doc.parcel_index(id), true).coord,
        };
        let vertex = drag.vertex;
        let Ok(ring) = target_ring_mut(ctx, target) else {
            return;
        };
        set_ring_vertex(ring, vertex, coord);
        let area_sqm = ring_area(ring);
        ctx.emit(EditorEvent::DrawingAreaChanged { area_sqm });
    }

    /// Release: validate the dragged ring; on failure the pre-drag ring is restored.
    pub fn pointer_up(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        let target = self.target.ok_or(EditError::NotActive("editing"))?;
        self.commit_edit(ctx, target, drag.original)
    }

    /// Remove the vertex under the pointer; at least three distinct vertices must remain.
    pub fn delete_vertex(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<(), EditError> {
        if self.state != DrawState::Editing {
            return Err(EditError::NotActive("editing"));
        }
        let target = self.target.ok_or(EditError::NotActive("editing"))?;
        let (hit_px, eps) = (ctx.cfg.vertex_hit_px, ctx.cfg.eps);
        let ring = target_ring(ctx, target)?;
        let Some(vertex) = vertex_under(ring, raw, hit_px, ctx.surface, eps) else {
            return Ok(());
        };
        let original = ring.to_vec();
        let mut open = open_ring(&original, eps).to_vec();
        if open.len() <= 3 {
            return Err(EditError::TooFewPoints {
                need: 3,
                got: open.len().saturating_sub(1),
            });
        }
        open.remove(vertex);
        *target_ring_mut(ctx, target)? = closed_ring(&open, eps);
        self.commit_edit(ctx, target, original)
    }

    fn commit_edit(
        &mut self,
        ctx: &mut Ctx,
        target: EditTarget,
        original: Vec<Coord>,
    ) -> Result<(), EditError> {
        let ring = target_ring(ctx, target)?.to_vec();
        let checked = match target {
            EditTarget::Boundary => ctx.check_boundary_ring(&ring).map(|_| ring),
            EditTarget::Parcel(id) => {
                let index = ctx.doc.parcel_index(id);
                ctx.check_parcel_ring(&ring, index)
            }
        };
        match checked {
            Ok(ring) => {
                let area_sqm = ring_area(&ring);
                *target_ring_mut(ctx, target)? = ring;
                match target {
                    EditTarget::Boundary => ctx.emit(EditorEvent::BoundaryChanged { area_sqm }),
                    EditTarget::Parcel(id) => {
                        let index = ctx.doc.parcel_index(id).ok_or(EditError::NoSuchFeature(id))?;
                        ctx.emit(EditorEvent::ParcelChanged { index, id, area_sqm });
                    }
                }
                Ok(())
            }
            Err(err) => {
                *target_ring_mut(ctx, target)? = original;
                Err(err)
            }
        }
    }
}

fn target_ring<'c>(ctx: &'c Ctx, target: EditTarget) -> Result<&'c [Coord], EditError> {
    match target {
        EditTarget::Boundary => ctx.doc.boundary_ring().ok_or(EditError::NoBoundary),
        EditTarget::Parcel(id) => ctx
            .doc
            .parcels
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.ring.as_slice())
            .ok_or(EditError::NoSuchFeature(id)),
    }
}

fn target_ring_mut<'c>(
    ctx: &'c mut Ctx,
    target: EditTarget,
) -> Result<&'c mut Vec<Coord>, EditError> {
    match target {
        EditTarget::Boundary => ctx
            .doc
            .boundary
            .as_mut()
            .map(|b| &mut b.ring)
            .ok_or(EditError::NoBoundary),
        EditTarget::Parcel(id) => ctx
            .doc
            .parcels
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| &mut p.ring)
            .ok_or(EditError::NoSuchFeature(id)),
    }
}
