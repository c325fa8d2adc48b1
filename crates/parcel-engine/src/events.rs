//! Typed editor events and their synchronous dispatch.
//!
//! Listeners run in registration order on the emitting call stack, so an
//! event always follows the mutation it describes.

use serde::Serialize;
use tracing::debug;

use crate::error::MessageLevel;
use crate::geom::Coord;
use crate::model::{FeatureId, LinearKind};
use crate::snap::SnapLayer;
use crate::tools::{DrawMode, FillMode};

#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    DrawingStarted { mode: DrawMode },
    DrawingCancelled,
    DrawingCompleted { mode: DrawMode, area_sqm: f64 },
    DrawingAreaChanged { area_sqm: f64 },

    BoundaryChanged { area_sqm: f64 },
    ParcelAdded { index: usize, id: FeatureId, area_sqm: f64 },
    ParcelRemoved { index: usize, id: FeatureId, area_sqm: f64 },
    ParcelChanged { index: usize, id: FeatureId, area_sqm: f64 },

    FillStarted { mode: FillMode },
    FillCancelled,
    FillConfirmed { area_sqm: f64 },
    FillSelectionChanged { count: usize, total_area_sqm: f64 },

    SliceStarted,
    SliceCancelled,
    SlicePointSelected { point: Coord },
    SliceCompleted { first: FeatureId, second: FeatureId },
    SliceMessage { level: MessageLevel, message: String },

    LineDrawStarted { kind: LinearKind },
    LineDrawCancelled,
    LineDrawCompleted { kind: LinearKind, id: FeatureId, length_m: f64 },
    LineDrawLengthChanged { length_m: f64 },
    LinearRemoved { kind: LinearKind, id: FeatureId },

    SnappingChanged { layer: SnapLayer, enabled: bool },
    ValidationError { message: String },
    Message { level: MessageLevel, message: String },
}

impl EditorEvent {
    /// Wire name of the event (`topic:action`).
    pub fn name(&self) -> &'static str {
        use EditorEvent::*;
        match self {
            DrawingStarted { .. } => "drawing:started",
            DrawingCancelled => "drawing:cancelled",
            DrawingCompleted { .. } => "drawing:completed",
            DrawingAreaChanged { .. } => "drawing:areaChanged",
            BoundaryChanged { .. } => "boundary:changed",
            ParcelAdded { .. } => "parcel:added",
            ParcelRemoved { .. } => "parcel:removed",
            ParcelChanged { .. } => "parcel:changed",
            FillStarted { .. } => "fill:started",
            FillCancelled => "fill:cancelled",
            FillConfirmed { .. } => "fill:confirmed",
            FillSelectionChanged { .. } => "fill:selectionChanged",
            SliceStarted => "slice:started",
            SliceCancelled => "slice:cancelled",
            SlicePointSelected { .. } => "slice:pointSelected",
            SliceCompleted { .. } => "slice:completed",
            SliceMessage { .. } => "slice:message",
            LineDrawStarted { .. } => "linedraw:started",
            LineDrawCancelled => "linedraw:cancelled",
            LineDrawCompleted { .. } => "linedraw:completed",
            LineDrawLengthChanged { .. } => "linedraw:lengthChanged",
            LinearRemoved { .. } => "linear:removed",
            SnappingChanged { layer, .. } => layer.event_name(),
            ValidationError { .. } => "validation:error",
            Message { .. } => "message",
        }
    }
}

/// Serializable form of an event for logs and replay transcripts.
#[derive(Clone, Debug, Serialize)]
pub struct EventRecord {
    pub name: &'static str,
    pub detail: String,
}

impl From<&EditorEvent> for EventRecord {
    fn from(e: &EditorEvent) -> Self {
        Self {
            name: e.name(),
            detail: format!("{e:?}"),
        }
    }
}

/// Handle returned by `EventBus::subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&EditorEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, f: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + 'static,
    {
        let id = ListenerId(self.next);
        self.next += 1;
        self.listeners.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: EditorEvent) {
        debug!(event = event.name(), "emit");
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let l1 = log.clone();
        bus.subscribe(move |e| l1.borrow_mut().push(format!("a:{}", e.name())));
        let l2 = log.clone();
        let second = bus.subscribe(move |e| l2.borrow_mut().push(format!("b:{}", e.name())));
        bus.emit(EditorEvent::SliceStarted);
        assert!(bus.unsubscribe(second));
        bus.emit(EditorEvent::FillCancelled);
        assert_eq!(
            *log.borrow(),
            vec!["a:slice:started", "b:slice:started", "a:fill:cancelled"]
        );
    }

    #[test]
    fn snapping_events_are_named_per_layer() {
        let e = EditorEvent::SnappingChanged {
            layer: SnapLayer::Parcels,
            enabled: false,
        };
        assert_eq!(e.name(), "snapping:parcelsChanged");
        let rec = EventRecord::from(&e);
        assert!(rec.detail.contains("Parcels"));
    }
}
