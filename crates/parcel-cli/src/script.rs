//! Headless replay of editor operations from a JSON script.
//!
//! A script is `{ "view": {...}, "steps": [ {"op": "...", ...}, ... ] }`.
//! Coordinates are `[x, y]` map units. Failed steps are logged and recorded;
//! the editor stays usable, so replay continues unless `strict` is set.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use parcel_engine::events::EventRecord;
use parcel_engine::model::{FeatureId, LinearKind};
use parcel_engine::prelude::*;
use parcel_engine::snap::SnapLayer;
use parcel_engine::tools::EditTarget;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct View {
    pub center: [f64; 2],
    /// Map units per pixel.
    pub resolution: f64,
    #[serde(default = "default_size")]
    pub size_px: [f64; 2],
}

fn default_size() -> [f64; 2] {
    [1024.0, 768.0]
}

impl View {
    fn transform(&self) -> ViewTransform {
        ViewTransform::new(
            Vec2::new(self.center[0], self.center[1]),
            self.resolution,
            Vec2::new(self.size_px[0], self.size_px[1]),
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    View(View),
    SetMode { mode: DrawMode },
    Snapping { layer: SnapLayer, enabled: bool },
    StartDrawing { mode: DrawMode },
    StartFill { mode: FillMode },
    StartSlice,
    StartLine { kind: LinearKind },
    StartRemove,
    EditBoundary,
    EditParcel { id: u64 },
    EndEdit,
    Move { at: [f64; 2] },
    Click { at: [f64; 2] },
    AddPoint { at: [f64; 2] },
    Down { at: [f64; 2] },
    Up,
    DeleteVertex { at: [f64; 2] },
    Confirm,
    Undo,
    Cancel,
    RemoveParcel { index: usize },
    RemoveLinear { kind: LinearKind, id: u64 },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Script {
    pub view: Option<View>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepFailure {
    pub step: usize,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    pub applied: usize,
    pub failures: Vec<StepFailure>,
    pub events: Vec<EventRecord>,
}

fn at(p: [f64; 2]) -> Coord {
    Coord::new(p[0], p[1])
}

fn apply(editor: &mut Editor<ViewTransform>, step: &Step, now: Instant) -> Result<(), EditError> {
    match step {
        Step::View(v) => {
            editor.set_surface(v.transform(), now);
            Ok(())
        }
        Step::SetMode { mode } => {
            editor.set_mode(*mode);
            Ok(())
        }
        Step::Snapping { layer, enabled } => {
            editor.set_snapping(*layer, *enabled);
            Ok(())
        }
        Step::StartDrawing { mode } => editor.start_drawing(*mode),
        Step::StartFill { mode } => editor.start_fill(*mode),
        Step::StartSlice => editor.start_slice(),
        Step::StartLine { kind } => editor.start_line(*kind),
        Step::StartRemove => {
            editor.start_remove();
            Ok(())
        }
        Step::EditBoundary => editor.begin_edit(EditTarget::Boundary),
        Step::EditParcel { id } => editor.begin_edit(EditTarget::Parcel(FeatureId(*id))),
        Step::EndEdit => editor.end_edit(),
        Step::Move { at: p } => {
            editor.pointer_move(at(*p));
            Ok(())
        }
        Step::Click { at: p } => editor.click(at(*p)),
        Step::AddPoint { at: p } => editor.add_point(at(*p)),
        Step::Down { at: p } => editor.pointer_down(at(*p)),
        Step::Up => editor.pointer_up(),
        Step::DeleteVertex { at: p } => editor.delete_vertex(at(*p)),
        Step::Confirm => editor.confirm(),
        Step::Undo => editor.undo(),
        Step::Cancel => {
            editor.cancel();
            Ok(())
        }
        Step::RemoveParcel { index } => editor.remove_parcel(*index),
        Step::RemoveLinear { kind, id } => editor.remove_linear(*kind, FeatureId(*id)),
    }
}

/// Run every step against `editor`, collecting emitted events.
pub fn replay(
    editor: &mut Editor<ViewTransform>,
    script: &Script,
    strict: bool,
) -> Result<Transcript> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let listener = editor.subscribe(move |e| sink.borrow_mut().push(EventRecord::from(e)));

    // Scripts have no wall clock; each step advances a virtual one.
    let start = Instant::now();
    if let Some(v) = &script.view {
        editor.set_surface(v.transform(), start);
    }
    let mut transcript = Transcript::default();
    for (i, step) in script.steps.iter().enumerate() {
        let now = start + Duration::from_millis(i as u64 * 50);
        debug!(step = i, ?step, "replay");
        match apply(editor, step, now) {
            Ok(()) => transcript.applied += 1,
            Err(e) => {
                warn!(step = i, error = %e, "step failed");
                if strict {
                    editor.unsubscribe(listener);
                    bail!("step {i} failed: {e}");
                }
                transcript.failures.push(StepFailure {
                    step: i,
                    error: e.to_string(),
                });
            }
        }
    }
    editor.unsubscribe(listener);
    transcript.events = events.take();
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "view": {"center": [50, 50], "resolution": 0.25, "size_px": [800, 800]},
        "steps": [
            {"op": "start_drawing", "mode": "boundary"},
            {"op": "add_point", "at": [10, 10]},
            {"op": "add_point", "at": [90, 10]},
            {"op": "add_point", "at": [50, 90]},
            {"op": "confirm"},
            {"op": "start_drawing", "mode": "boundary"}
        ]
    }"#;

    #[test]
    fn replay_draws_boundary_and_records_failure() {
        let script = Script::from_json_str(TRIANGLE).unwrap();
        let mut editor = Editor::new(EditorCfg::default(), ViewTransform::default());
        let t = replay(&mut editor, &script, false).unwrap();
        assert_eq!(t.applied, 5);
        assert_eq!(t.failures.len(), 1);
        assert_eq!(t.failures[0].step, 5);
        let area = editor.document().boundary.as_ref().unwrap().area();
        assert!((area - 3200.0).abs() < 1e-9);
        assert!(t.events.iter().any(|e| e.name == "drawing:completed"));
        assert!(t.events.iter().any(|e| e.name == "validation:error"));
    }

    #[test]
    fn strict_replay_stops_at_first_failure() {
        let script = Script::from_json_str(TRIANGLE).unwrap();
        let mut editor = Editor::new(EditorCfg::default(), ViewTransform::default());
        assert!(replay(&mut editor, &script, true).is_err());
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(Script::from_json_str(r#"{"steps": [{"op": "teleport"}]}"#).is_err());
    }
}
