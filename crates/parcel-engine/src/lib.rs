//! Land-parcel map editing engine.
//!
//! Layers, bottom-up:
//! - `geom`: tolerance-aware planar predicates and ring helpers.
//! - `boolean`: robust polygon set operations behind `PolygonSetOps`.
//! - `model`, `reference`: the editable document and read-only reference data.
//! - `snap`: pointer snapping with tiered precedence.
//! - `tools`, `editor`: the drawing state machine and the single-active-tool controller.
//! - `geojson`: FeatureCollection import/export.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.

pub mod boolean;
pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod geojson;
pub mod geom;
pub mod gen;
pub mod model;
pub mod reference;
pub mod snap;
pub mod surface;
pub mod tools;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom::{Coord, GeomCfg};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::boolean::{GapReport, GeoClipper, PolygonSetOps};
    pub use crate::config::EditorCfg;
    pub use crate::editor::Editor;
    pub use crate::error::{EditError, MessageLevel};
    pub use crate::events::{EditorEvent, EventRecord};
    pub use crate::geojson::{export_document, import_document, CrsTransform, FeatureCollection};
    pub use crate::geom::{Affine2, Coord, Extent, GeomCfg};
    pub use crate::model::{Document, FeatureId, LinearKind, Metadata, ReferenceFeature};
    pub use crate::snap::{SnapLayer, SnapResult, SnapSource};
    pub use crate::surface::{MapSurface, ViewTransform};
    pub use crate::tools::{ActiveTool, DrawMode, FillMode};
    pub use nalgebra::Vector2 as Vec2;
}
