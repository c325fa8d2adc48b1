//! Delete the feature under the pointer.

use tracing::info;

use crate::error::EditError;
use crate::events::EditorEvent;
use crate::geom::{closest_point_on_line, is_point_inside_or_on_boundary, Coord};
use crate::model::{FeatureId, LinearKind};

use super::Ctx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removed {
    Parcel(FeatureId),
    Linear(LinearKind, FeatureId),
}

#[derive(Clone, Debug, Default)]
pub struct RemoveTool {
    active: bool,
}

impl RemoveTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn cancel(&mut self) -> Result<(), EditError> {
        if !self.active {
            return Err(EditError::NotActive("remove"));
        }
        self.active = false;
        Ok(())
    }

    /// Linear features within the edge tolerance win over the parcel beneath them.
    pub fn click(&mut self, ctx: &mut Ctx, raw: Coord) -> Result<Option<Removed>, EditError> {
        if !self.active {
            return Err(EditError::NotActive("remove"));
        }
        let tol = ctx.snap.edge_tolerance(ctx.surface.resolution());
        let line_hit = [LinearKind::Hedgerow, LinearKind::Watercourse]
            .into_iter()
            .flat_map(|kind| {
                ctx.doc
                    .linear(kind)
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, f)| {
                        closest_point_on_line(raw, &f.coordinates).map(|(_, _, d)| (kind, i, d))
                    })
            })
            .filter(|(_, _, d)| *d <= tol)
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((kind, i, _)) = line_hit {
            let f = ctx.doc.linear_mut(kind).remove(i);
            info!(kind = kind.as_str(), id = %f.id, "linear feature removed");
            ctx.emit(EditorEvent::LinearRemoved { kind, id: f.id });
            return Ok(Some(Removed::Linear(kind, f.id)));
        }
        let eps = ctx.cfg.eps;
        let Some(index) = ctx
            .doc
            .parcels
            .iter()
            .rposition(|p| is_point_inside_or_on_boundary(raw, &p.ring, eps))
        else {
            return Ok(None);
        };
        let parcel = ctx.remove_parcel(index)?;
        Ok(Some(Removed::Parcel(parcel.id)))
    }
}
