//! The editing controller.
//!
//! `Editor` owns the document, configuration, injected map surface, snap
//! resolver, reference index and event bus, and routes pointer and keyboard
//! actions to the single active tool. Starting a tool cancels whichever tool
//! was active before. Every failed operation is reported as an event
//! (`validation:error` for rejected input, a typed message otherwise) and
//! returned to the caller; the editor always stays usable.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::boolean::{gap_report, GapReport, GeoClipper};
use crate::config::EditorCfg;
use crate::error::EditError;
use crate::events::{EditorEvent, EventBus, ListenerId};
use crate::geom::Coord;
use crate::model::{Document, FeatureId, LinearKind, ReferenceFeature, Violation};
use crate::reference::{LoadOutcome, ReferenceIndex, ReferenceLoader, ReferenceSource};
use crate::snap::{SnapLayer, SnapResolver};
use crate::surface::MapSurface;
use crate::tools::{
    ActiveTool, Ctx, DrawMode, DrawState, DrawTool, EditTarget, FillMode, FillTool, LineTool,
    RemoveTool, SliceTool,
};

macro_rules! with_ctx {
    ($ed:ident, |$ctx:ident| $body:expr) => {{
        #[allow(unused_mut)]
        let mut $ctx = Ctx {
            doc: &mut $ed.doc,
            cfg: &$ed.cfg,
            surface: &$ed.surface,
            snap: &$ed.snap,
            refs: &$ed.refs,
            ops: &$ed.ops,
            events: &mut $ed.events,
        };
        $body
    }};
}

pub struct Editor<S: MapSurface> {
    doc: Document,
    cfg: EditorCfg,
    surface: S,
    snap: SnapResolver,
    refs: ReferenceIndex,
    loader: ReferenceLoader,
    ops: GeoClipper,
    events: EventBus,
    mode: DrawMode,
    active: ActiveTool,
    draw: DrawTool,
    fill: FillTool,
    slice: SliceTool,
    line: LineTool,
    remove: RemoveTool,
}

impl<S: MapSurface> Editor<S> {
    pub fn new(cfg: EditorCfg, surface: S) -> Self {
        Self::with_document(cfg, surface, Document::new())
    }

    pub fn with_document(cfg: EditorCfg, surface: S, doc: Document) -> Self {
        let mode = if doc.boundary.is_some() {
            DrawMode::Parcel
        } else {
            DrawMode::Boundary
        };
        Self {
            snap: SnapResolver::new(&cfg),
            loader: ReferenceLoader::new(
                Duration::from_millis(cfg.fetch_debounce_ms),
                cfg.min_fetch_zoom,
            ),
            doc,
            cfg,
            surface,
            refs: ReferenceIndex::new(),
            ops: GeoClipper,
            events: EventBus::new(),
            mode,
            active: ActiveTool::None,
            draw: DrawTool::new(),
            fill: FillTool::new(),
            slice: SliceTool::new(),
            line: LineTool::new(),
            remove: RemoveTool::new(),
        }
    }

    // ---- accessors -----------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn config(&self) -> &EditorCfg {
        &self.cfg
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Replace the view (pan / zoom); also schedules a reference refresh.
    pub fn set_surface(&mut self, surface: S, now: Instant) {
        self.surface = surface;
        self.loader
            .view_changed(self.surface.view_extent(), self.surface.zoom(), now);
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.refs
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn active_tool(&self) -> ActiveTool {
        self.active
    }

    pub fn draw_tool(&self) -> &DrawTool {
        &self.draw
    }

    pub fn fill_tool(&self) -> &FillTool {
        &self.fill
    }

    pub fn slice_tool(&self) -> &SliceTool {
        &self.slice
    }

    pub fn line_tool(&self) -> &LineTool {
        &self.line
    }

    pub fn snap_resolver(&self) -> &SnapResolver {
        &self.snap
    }

    pub fn subscribe<F>(&mut self, f: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // ---- settings ------------------------------------------------------

    /// Switch between boundary and parcel editing; cancels the active tool.
    pub fn set_mode(&mut self, mode: DrawMode) {
        if self.mode != mode {
            self.cancel_active();
            self.mode = mode;
            debug!(?mode, "editing mode changed");
        }
    }

    pub fn set_snapping(&mut self, layer: SnapLayer, enabled: bool) {
        if self.snap.set_enabled(layer, enabled) {
            self.events.emit(EditorEvent::SnappingChanged { layer, enabled });
        }
    }

    // ---- reference features --------------------------------------------

    pub fn set_references(&mut self, features: Vec<ReferenceFeature>) {
        self.refs.replace(features);
    }

    /// Record a view change at `now` for the debounced reference fetch.
    pub fn view_changed(&mut self, now: Instant) {
        self.loader
            .view_changed(self.surface.view_extent(), self.surface.zoom(), now);
    }

    pub fn poll_references(
        &mut self,
        now: Instant,
        source: &mut dyn ReferenceSource,
    ) -> LoadOutcome {
        self.loader.poll(now, source, &mut self.refs)
    }

    // ---- tool lifecycle ------------------------------------------------

    /// Cancel whatever tool is active; a no-op when none is.
    pub fn cancel_active(&mut self) {
        let tool = self.active;
        let result = match tool {
            ActiveTool::None => Ok(()),
            ActiveTool::Draw if self.draw.state() == DrawState::Editing => {
                with_ctx!(self, |ctx| self.draw.end_edit(&mut ctx))
            }
            ActiveTool::Draw => with_ctx!(self, |ctx| self.draw.cancel(&mut ctx)),
            ActiveTool::Fill => with_ctx!(self, |ctx| self.fill.cancel(&mut ctx)),
            ActiveTool::Slice => with_ctx!(self, |ctx| self.slice.cancel(&mut ctx)),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.cancel(&mut ctx)),
            ActiveTool::Remove => self.remove.cancel(),
        };
        if let Err(err) = result {
            debug!(?tool, %err, "cancel of inactive tool ignored");
        }
        self.active = ActiveTool::None;
    }

    fn switch_to(&mut self, tool: ActiveTool) {
        if self.active != ActiveTool::None {
            self.cancel_active();
        }
        self.active = tool;
        debug!(?tool, "tool activated");
    }

    pub fn start_drawing(&mut self, mode: DrawMode) -> Result<(), EditError> {
        if self.active == ActiveTool::Draw && self.draw.state() == DrawState::Drawing {
            return self.report(Err(EditError::AlreadyDrawing));
        }
        self.switch_to(ActiveTool::Draw);
        let r = with_ctx!(self, |ctx| self.draw.start(&mut ctx, mode));
        if r.is_ok() {
            self.mode = mode;
        }
        self.finish(r)
    }

    pub fn start_fill(&mut self, mode: FillMode) -> Result<(), EditError> {
        self.switch_to(ActiveTool::Fill);
        let r = with_ctx!(self, |ctx| self.fill.start(&mut ctx, mode));
        self.finish(r)
    }

    pub fn start_slice(&mut self) -> Result<(), EditError> {
        self.switch_to(ActiveTool::Slice);
        let mode = self.mode;
        let r = with_ctx!(self, |ctx| self.slice.start(&mut ctx, mode));
        self.finish(r)
    }

    pub fn start_line(&mut self, kind: LinearKind) -> Result<(), EditError> {
        self.switch_to(ActiveTool::Line);
        let r = with_ctx!(self, |ctx| self.line.start(&mut ctx, kind));
        self.finish(r)
    }

    pub fn start_remove(&mut self) {
        self.switch_to(ActiveTool::Remove);
        self.remove.start();
    }

    /// Enter vertex editing of the boundary or one parcel.
    pub fn begin_edit(&mut self, target: EditTarget) -> Result<(), EditError> {
        self.switch_to(ActiveTool::Draw);
        let r = with_ctx!(self, |ctx| self.draw.begin_edit(&mut ctx, target));
        self.finish(r)
    }

    pub fn end_edit(&mut self) -> Result<(), EditError> {
        let r = with_ctx!(self, |ctx| self.draw.end_edit(&mut ctx));
        self.finish(r)
    }

    // ---- pointer / keyboard --------------------------------------------

    pub fn pointer_move(&mut self, p: Coord) {
        match self.active {
            ActiveTool::Draw => with_ctx!(self, |ctx| self.draw.pointer_move(&mut ctx, p)),
            ActiveTool::Fill => {
                with_ctx!(self, |ctx| {
                    self.fill.hover_at(&ctx, p);
                })
            }
            ActiveTool::Slice => with_ctx!(self, |ctx| self.slice.pointer_move(&ctx, p)),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.pointer_move(&ctx, p)),
            ActiveTool::Remove | ActiveTool::None => {}
        }
    }

    /// Primary click at `p` for the active tool.
    pub fn click(&mut self, p: Coord) -> Result<(), EditError> {
        let r = match self.active {
            ActiveTool::Draw => with_ctx!(self, |ctx| self.draw.click(&mut ctx, p)),
            ActiveTool::Fill => with_ctx!(self, |ctx| self.fill.click(&mut ctx, p).map(|_| ())),
            ActiveTool::Slice => with_ctx!(self, |ctx| self.slice.click(&mut ctx, p).map(|_| ())),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.add_point(&mut ctx, p)),
            ActiveTool::Remove => with_ctx!(self, |ctx| self.remove.click(&mut ctx, p).map(|_| ())),
            ActiveTool::None => Err(EditError::NotActive("tool")),
        };
        self.finish(r)
    }

    /// Append a vertex at `p` without close detection (keyboard confirm).
    pub fn add_point(&mut self, p: Coord) -> Result<(), EditError> {
        let r = match self.active {
            ActiveTool::Draw => with_ctx!(self, |ctx| self.draw.add_point(&mut ctx, p)),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.add_point(&mut ctx, p)),
            _ => Err(EditError::NotActive("drawing")),
        };
        self.finish(r)
    }

    pub fn pointer_down(&mut self, p: Coord) -> Result<(), EditError> {
        if self.active != ActiveTool::Draw {
            return Ok(());
        }
        let r = with_ctx!(self, |ctx| self.draw.pointer_down(&mut ctx, p));
        self.finish(r)
    }

    pub fn pointer_up(&mut self) -> Result<(), EditError> {
        if self.active != ActiveTool::Draw {
            return Ok(());
        }
        let r = with_ctx!(self, |ctx| self.draw.pointer_up(&mut ctx));
        self.finish(r)
    }

    pub fn delete_vertex(&mut self, p: Coord) -> Result<(), EditError> {
        let r = with_ctx!(self, |ctx| self.draw.delete_vertex(&mut ctx, p));
        self.finish(r)
    }

    /// Keyboard confirm: close the drawing, confirm the fill or finish the line.
    pub fn confirm(&mut self) -> Result<(), EditError> {
        let r = match self.active {
            ActiveTool::Draw => with_ctx!(self, |ctx| self.draw.close(&mut ctx)),
            ActiveTool::Fill => with_ctx!(self, |ctx| self.fill.confirm(&mut ctx).map(|_| ())),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.finish(&mut ctx).map(|_| ())),
            _ => Err(EditError::NotActive("tool")),
        };
        self.finish(r)
    }

    pub fn close_drawing(&mut self) -> Result<(), EditError> {
        let r = with_ctx!(self, |ctx| self.draw.close(&mut ctx));
        self.finish(r)
    }

    pub fn confirm_fill(&mut self) -> Result<f64, EditError> {
        let r = with_ctx!(self, |ctx| self.fill.confirm(&mut ctx));
        self.finish(r)
    }

    pub fn finish_line(&mut self) -> Result<FeatureId, EditError> {
        let r = with_ctx!(self, |ctx| self.line.finish(&mut ctx));
        self.finish(r)
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        let r = match self.active {
            ActiveTool::Draw => self.draw.undo_last_point(),
            ActiveTool::Line => with_ctx!(self, |ctx| self.line.undo_last_point(&mut ctx)),
            _ => Err(EditError::NotActive("drawing")),
        };
        self.finish(r)
    }

    pub fn cancel(&mut self) {
        self.cancel_active();
    }

    // ---- direct document operations ------------------------------------

    pub fn remove_parcel(&mut self, index: usize) -> Result<(), EditError> {
        let r = with_ctx!(self, |ctx| ctx.remove_parcel(index).map(|_| ()));
        self.finish(r)
    }

    pub fn remove_linear(&mut self, kind: LinearKind, id: FeatureId) -> Result<(), EditError> {
        let list = self.doc.linear_mut(kind);
        let r = match list.iter().position(|f| f.id == id) {
            Some(i) => {
                list.remove(i);
                self.events.emit(EditorEvent::LinearRemoved { kind, id });
                Ok(())
            }
            None => Err(EditError::NoSuchFeature(id)),
        };
        self.finish(r)
    }

    /// Boundary area not covered by parcels; `None` without a boundary.
    pub fn gap_report(&self) -> Option<GapReport> {
        let boundary = self.doc.boundary_ring()?;
        Some(gap_report(
            &self.ops,
            boundary,
            &self.doc.parcel_rings_except(None),
            self.cfg.area_threshold(),
        ))
    }

    pub fn check_invariants(&self) -> Vec<Violation> {
        self.doc
            .check_invariants(self.cfg.geom(), &self.ops, self.cfg.area_threshold())
    }

    // ---- reporting -----------------------------------------------------

    /// Drop tools that finished their work, then report errors.
    fn finish<T>(&mut self, r: Result<T, EditError>) -> Result<T, EditError> {
        let still_active = match self.active {
            ActiveTool::None => true,
            ActiveTool::Draw => {
                matches!(self.draw.state(), DrawState::Drawing | DrawState::Editing)
            }
            ActiveTool::Fill => self.fill.is_active(),
            ActiveTool::Slice => self.slice.is_active(),
            ActiveTool::Line => self.line.is_active(),
            ActiveTool::Remove => self.remove.is_active(),
        };
        if !still_active {
            self.active = ActiveTool::None;
        }
        self.report(r)
    }

    fn report<T>(&mut self, r: Result<T, EditError>) -> Result<T, EditError> {
        if let Err(err) = &r {
            let message = err.to_string();
            warn!(tool = ?self.active, %err, "operation rejected");
            let event = if err.is_input_rejection() {
                EditorEvent::ValidationError { message }
            } else if self.active == ActiveTool::Slice {
                EditorEvent::SliceMessage {
                    level: err.level(),
                    message,
                }
            } else {
                EditorEvent::Message {
                    level: err.level(),
                    message,
                }
            };
            self.events.emit(event);
        }
        r
    }
}
