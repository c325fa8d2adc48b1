//! Reference features: the read-only snap and fill sources.
//!
//! - `ReferenceIndex`: latest successfully fetched features with cached extents.
//! - `ReferenceSource`: external fetch capability (may be empty below a zoom).
//! - `ReferenceLoader`: debounces view changes, skips extents already covered
//!   by the last fetch and swallows source failures.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::geom::{
    closed_ring, is_point_inside_or_on_boundary, open_ring, ring_area, Coord, Extent,
};
use crate::model::{FeatureId, ReferenceFeature};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("reference fetch failed: {0}")]
    Failed(String),
}

pub trait ReferenceSource {
    fn fetch(&mut self, extent: &Extent, zoom: f64) -> Result<Vec<ReferenceFeature>, FetchError>;
}

/// In-memory source returning every feature that intersects the requested extent.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    pub features: Vec<ReferenceFeature>,
}

impl StaticSource {
    pub fn new(features: Vec<ReferenceFeature>) -> Self {
        Self { features }
    }
}

impl ReferenceSource for StaticSource {
    fn fetch(&mut self, extent: &Extent, _zoom: f64) -> Result<Vec<ReferenceFeature>, FetchError> {
        Ok(self
            .features
            .iter()
            .filter(|f| f.geometry.extent().is_some_and(|e| e.intersects(extent)))
            .cloned()
            .collect())
    }
}

/// A single polygon ring of a reference feature (multi-polygons split per part).
#[derive(Clone, Debug, PartialEq)]
pub struct RefPolygon {
    pub feature: FeatureId,
    pub part: usize,
    pub layer: String,
    pub ring: Vec<Coord>,
}

impl RefPolygon {
    pub fn area(&self) -> f64 {
        ring_area(&self.ring)
    }

    /// Same feature and part.
    pub fn same_source(&self, other: &RefPolygon) -> bool {
        self.feature == other.feature && self.part == other.part
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReferenceIndex {
    features: Vec<ReferenceFeature>,
    extents: Vec<Option<Extent>>,
    generation: u64,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: Vec<ReferenceFeature>) -> Self {
        let mut idx = Self::new();
        idx.replace(features);
        idx
    }

    /// Swap in a new feature set; bumps the generation counter.
    pub fn replace(&mut self, features: Vec<ReferenceFeature>) {
        self.extents = features.iter().map(|f| f.geometry.extent()).collect();
        self.features = features;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceFeature> {
        self.features.iter()
    }

    /// Features whose extent, grown by `tol`, contains `p`.
    pub fn near(&self, p: Coord, tol: f64) -> impl Iterator<Item = &ReferenceFeature> + '_ {
        self.features
            .iter()
            .zip(self.extents.iter())
            .filter(move |(_, e)| e.is_some_and(|e| e.buffered(tol).contains_point(p)))
            .map(|(f, _)| f)
    }

    /// Smallest-area polygon containing `p` among features on an allowed layer.
    pub fn polygon_at(&self, p: Coord, allowed_layers: &[String], eps: f64) -> Option<RefPolygon> {
        let mut best: Option<RefPolygon> = None;
        for f in self.near(p, eps) {
            if !allowed_layers.iter().any(|l| *l == f.layer) {
                continue;
            }
            for (part, ring) in f.geometry.rings().into_iter().enumerate() {
                if open_ring(ring, eps).len() < 3 || !is_point_inside_or_on_boundary(p, ring, eps) {
                    continue;
                }
                let area = ring_area(ring);
                if best.as_ref().is_none_or(|b| area < b.area()) {
                    best = Some(RefPolygon {
                        feature: f.id,
                        part,
                        layer: f.layer.clone(),
                        ring: closed_ring(ring, eps),
                    });
                }
            }
        }
        best
    }
}

/// What a call to `ReferenceLoader::poll` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No view change pending.
    Idle,
    /// Debounce delay not yet elapsed.
    Waiting,
    /// The view is already covered by the last fetch.
    AlreadyCovered,
    /// Zoomed out too far for reference data.
    BelowMinZoom,
    /// Index replaced with this many features.
    Loaded(usize),
    /// Source failed; index left untouched.
    Failed,
}

#[derive(Clone, Copy, Debug)]
struct PendingView {
    extent: Extent,
    zoom: f64,
    changed_at: Instant,
}

#[derive(Clone, Debug)]
pub struct ReferenceLoader {
    debounce: Duration,
    min_zoom: f64,
    pending: Option<PendingView>,
    last_fetched: Option<Extent>,
}

impl ReferenceLoader {
    pub fn new(debounce: Duration, min_zoom: f64) -> Self {
        Self {
            debounce,
            min_zoom,
            pending: None,
            last_fetched: None,
        }
    }

    /// Record a view change; restarts the debounce timer.
    pub fn view_changed(&mut self, extent: Extent, zoom: f64, now: Instant) {
        self.pending = Some(PendingView {
            extent,
            zoom,
            changed_at: now,
        });
    }

    /// Run a fetch if the debounce delay has elapsed since the last view change.
    pub fn poll(
        &mut self,
        now: Instant,
        source: &mut dyn ReferenceSource,
        index: &mut ReferenceIndex,
    ) -> LoadOutcome {
        let Some(view) = self.pending else {
            return LoadOutcome::Idle;
        };
        if now.saturating_duration_since(view.changed_at) < self.debounce {
            return LoadOutcome::Waiting;
        }
        self.pending = None;
        if view.zoom < self.min_zoom {
            return LoadOutcome::BelowMinZoom;
        }
        if self
            .last_fetched
            .is_some_and(|last| last.contains_extent(&view.extent))
        {
            debug!("reference view already covered");
            return LoadOutcome::AlreadyCovered;
        }
        match source.fetch(&view.extent, view.zoom) {
            Ok(features) => {
                let n = features.len();
                index.replace(features);
                self.last_fetched = Some(view.extent);
                debug!(features = n, zoom = view.zoom, "reference index refreshed");
                LoadOutcome::Loaded(n)
            }
            Err(err) => {
                warn!(%err, "reference fetch failed; keeping previous index");
                LoadOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RefGeometry;
    use nalgebra::vector;

    fn square(id: u64, layer: &str, x: f64, y: f64, s: f64) -> ReferenceFeature {
        ReferenceFeature {
            id: FeatureId(id),
            layer: layer.to_string(),
            geometry: RefGeometry::Polygon(vec![
                vector![x, y],
                vector![x + s, y],
                vector![x + s, y + s],
                vector![x, y + s],
                vector![x, y],
            ]),
        }
    }

    struct Failing;
    impl ReferenceSource for Failing {
        fn fetch(&mut self, _: &Extent, _: f64) -> Result<Vec<ReferenceFeature>, FetchError> {
            Err(FetchError::Failed("offline".into()))
        }
    }

    #[test]
    fn polygon_at_prefers_smallest_allowed() {
        let idx = ReferenceIndex::from_features(vec![
            square(1, "field", 0.0, 0.0, 100.0),
            square(2, "field", 10.0, 10.0, 20.0),
            square(3, "building", 12.0, 12.0, 5.0),
        ]);
        let allow = vec!["field".to_string()];
        let hit = idx.polygon_at(vector![14.0, 14.0], &allow, 1e-3).unwrap();
        assert_eq!(hit.feature, FeatureId(2));
        assert!(idx.polygon_at(vector![500.0, 0.0], &allow, 1e-3).is_none());
    }

    #[test]
    fn loader_debounces_dedups_and_swallows_failures() {
        let t0 = Instant::now();
        let mut loader = ReferenceLoader::new(Duration::from_millis(300), 13.0);
        let mut idx = ReferenceIndex::new();
        let mut src = StaticSource::new(vec![square(1, "field", 0.0, 0.0, 10.0)]);
        let view = Extent::new(vector![-50.0, -50.0], vector![50.0, 50.0]);

        assert_eq!(loader.poll(t0, &mut src, &mut idx), LoadOutcome::Idle);
        loader.view_changed(view, 16.0, t0);
        assert_eq!(
            loader.poll(t0 + Duration::from_millis(100), &mut src, &mut idx),
            LoadOutcome::Waiting
        );
        assert_eq!(
            loader.poll(t0 + Duration::from_millis(400), &mut src, &mut idx),
            LoadOutcome::Loaded(1)
        );
        assert_eq!(idx.generation(), 1);

        let inner = Extent::new(vector![-10.0, -10.0], vector![10.0, 10.0]);
        loader.view_changed(inner, 17.0, t0);
        assert_eq!(
            loader.poll(t0 + Duration::from_secs(1), &mut src, &mut idx),
            LoadOutcome::AlreadyCovered
        );

        loader.view_changed(view.buffered(100.0), 16.0, t0);
        assert_eq!(
            loader.poll(t0 + Duration::from_secs(1), &mut Failing, &mut idx),
            LoadOutcome::Failed
        );
        assert_eq!(idx.len(), 1);

        loader.view_changed(view.buffered(100.0), 10.0, t0);
        assert_eq!(
            loader.poll(t0 + Duration::from_secs(1), &mut src, &mut idx),
            LoadOutcome::BelowMinZoom
        );
    }
}
