//! Editor configuration (tolerances, pixel thresholds, fill and fetch policy).
//!
//! Every field has a default so partial JSON files deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::boolean::AreaThreshold;
use crate::geom::GeomCfg;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorCfg {
    /// Distance tolerance in map units (≈ 1 mm).
    pub eps: f64,
    /// Edge snap tolerance in pixels.
    pub snap_tolerance_px: f64,
    /// Vertex tolerance = factor × edge tolerance.
    pub vertex_tolerance_factor: f64,
    /// Pointer-to-first-vertex distance (pixels) at which a ring can be closed.
    pub close_tolerance_px: f64,
    /// Pointer-to-vertex distance (pixels) that counts as "over" a vertex.
    pub vertex_hit_px: f64,
    /// Maximum pointer-to-edge distance (pixels) for the ghost vertex.
    pub ghost_max_px: f64,
    /// Minimum distance between the two slice points (map units).
    pub min_slice_distance: f64,
    /// Absolute floor for negligible overlaps and gaps (m²).
    pub negligible_overlap_sqm: f64,
    /// Relative part (of the smaller area) for negligible overlaps.
    pub negligible_overlap_rel: f64,
    /// Reference layer types that may be picked by the fill tool.
    pub fill_layers: Vec<String>,
    /// In parcel fill mode, clip a rejected candidate to the free space instead.
    pub clip_fill_to_available: bool,
    /// Delay after the last view change before reference features are fetched.
    pub fetch_debounce_ms: u64,
    /// No reference fetches below this zoom level.
    pub min_fetch_zoom: f64,
    /// Number of parcel colours cycled through.
    pub parcel_palette_size: usize,
}

impl Default for EditorCfg {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            snap_tolerance_px: 10.0,
            vertex_tolerance_factor: 1.5,
            close_tolerance_px: 12.0,
            vertex_hit_px: 8.0,
            ghost_max_px: 20.0,
            min_slice_distance: 1.0,
            negligible_overlap_sqm: 0.01,
            negligible_overlap_rel: 1e-6,
            fill_layers: vec!["field".to_string(), "land_parcel".to_string()],
            clip_fill_to_available: false,
            fetch_debounce_ms: 300,
            min_fetch_zoom: 13.0,
            parcel_palette_size: 8,
        }
    }
}

impl EditorCfg {
    pub fn geom(&self) -> GeomCfg {
        GeomCfg::new(self.eps)
    }

    pub fn area_threshold(&self) -> AreaThreshold {
        AreaThreshold {
            absolute: self.negligible_overlap_sqm,
            relative: self.negligible_overlap_rel,
        }
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorCfg::from_json_str(r#"{"snap_tolerance_px": 4.0, "fill_layers": ["crop"]}"#)
            .unwrap();
        assert_eq!(cfg.snap_tolerance_px, 4.0);
        assert_eq!(cfg.fill_layers, vec!["crop".to_string()]);
        assert_eq!(cfg.eps, 1e-3);
        assert_eq!(cfg.vertex_tolerance_factor, 1.5);
    }
}
