//! Hedgerow and watercourse polylines.

use tracing::{debug, info};

use crate::error::EditError;
use crate::events::EditorEvent;
use crate::geom::{
    correct_line_to_boundary, is_line_within_boundary, line_length, points_equal, Coord,
};
use crate::model::{FeatureId, LinearFeature, LinearKind, Metadata};

use super::Ctx;

#[derive(Clone, Debug, Default)]
pub struct LineTool {
    kind: Option<LinearKind>,
    points: Vec<Coord>,
    cursor: Option<Coord>,
}

impl LineTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> Option<LinearKind> {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn length(&self) -> f64 {
        line_length(&self.points)
    }

    /// Placed points plus the pointer position.
    pub fn preview(&self) -> Option<Vec<Coord>> {
        let mut pts = self.points.clone();
        pts.extend(self.cursor);
        (self.is_active() && pts.len() >= 2).then_some(pts)
    }

    pub fn start(&mut self, ctx: &mut Ctx, kind: LinearKind) -> Result<(), EditError> {
        if self.is_active() {
            return Err(EditError::AlreadyDrawing);
        }
        *self = Self {
            kind: Some(kind),
            ..Self::default()
        };
        debug!(kind = kind.as_str(), "line drawing started");
        ctx.emit(EditorEvent::LineDrawStarted { kind });
        Ok(())
    }

    pub fn pointer_move(&mut self, ctx: &Ctx, raw: Coord) {
        if self.is_active() {
            self.cursor = Some(ctx.snap(raw, None, false).coord);
        }
    }

    pub fn add_point(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<(), EditError> {
        if !self.is_active() {
            return Err(EditError::NotActive("line drawing"));
        }
        let c = ctx.snap(raw, None, false).coord;
        if self
            .points
            .last()
            .is_some_and(|&last| points_equal(last, c, ctx.cfg.eps))
        {
            return Ok(());
        }
        self.points.push(c);
        self.cursor = None;
        ctx.emit(EditorEvent::LineDrawLengthChanged {
            length_m: self.length(),
        });
        Ok(())
    }

    pub fn undo_last_point(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if !self.is_active() {
            return Err(EditError::NotActive("line drawing"));
        }
        if self.points.pop().is_some() {
            ctx.emit(EditorEvent::LineDrawLengthChanged {
                length_m: self.length(),
            });
        }
        Ok(())
    }

    /// Validate and store the line. A failure leaves the tool active for more editing.
    pub fn finish(&mut self, ctx: &mut Ctx) -> Result<FeatureId, EditError> {
        let kind = self.kind.ok_or(EditError::NotActive("line drawing"))?;
        if self.points.len() < 2 {
            return Err(EditError::TooFewPoints {
                need: 2,
                got: self.points.len(),
            });
        }
        let cfg = ctx.geom();
        let coordinates = match ctx.doc.boundary_ring() {
            Some(b) => {
                let corrected = correct_line_to_boundary(&self.points, b, cfg);
                if !is_line_within_boundary(&corrected, b, cfg) {
                    return Err(EditError::OutsideBoundary);
                }
                corrected
            }
            None => self.points.clone(),
        };
        let id = ctx.doc.allocate_id();
        let length_m = line_length(&coordinates);
        ctx.doc.linear_mut(kind).push(LinearFeature {
            id,
            kind,
            coordinates,
            metadata: Metadata::new(),
        });
        info!(kind = kind.as_str(), %id, length_m, "linear feature added");
        *self = Self::default();
        ctx.emit(EditorEvent::LineDrawCompleted { kind, id, length_m });
        Ok(id)
    }

    pub fn cancel(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if !self.is_active() {
            return Err(EditError::NotActive("line drawing"));
        }
        *self = Self::default();
        ctx.emit(EditorEvent::LineDrawCancelled);
        Ok(())
    }
}
