//! Merge several adjacent rings into one outer ring.
//!
//! Model (edge cancellation)
//! - Orient every input ring counter-clockwise and collect its directed edges.
//! - An edge whose reverse also occurs is interior to the union and cancels.
//! - The surviving edges are chained end-to-start until the walk returns to
//!   its first point; the visited start points form the merged ring.
//!
//! The walk only handles shared edges with matching vertices. When it fails,
//! leaves edges unvisited, or produces a self-touching ring, `merge_rings`
//! falls back to the robust union.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use super::PolygonSetOps;
use crate::geom::{
    ccw, closed_ring, dedup_consecutive, is_ring_self_intersecting, open_ring, Coord, GeomCfg,
};

/// Why a set of rings could not be merged into one outer ring.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    #[error("nothing to merge")]
    Empty,
    #[error("merged area would consist of {0} separate parts")]
    Disjoint(usize),
    #[error("merged area would contain a hole")]
    Hole,
    #[error("merged outline is degenerate")]
    Degenerate,
}

type Key = (i64, i64);

#[inline]
fn key(p: Coord, quantum: f64) -> Key {
    ((p.x / quantum).round() as i64, (p.y / quantum).round() as i64)
}

/// Edge-cancellation walk. `None` if fewer than 3 points survive, the walk
/// cannot close within `2 × edge count` steps, or edges are left unvisited.
pub fn merge_rings_by_edges(rings: &[Vec<Coord>], cfg: GeomCfg) -> Option<Vec<Coord>> {
    let quantum = cfg.eps;
    let mut edges: Vec<(Coord, Coord, Key, Key)> = Vec::new();
    for ring in rings {
        let open = dedup_consecutive(open_ring(&ccw(ring), cfg.eps), cfg.eps);
        let n = open.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let a = open[i];
            let b = open[(i + 1) % n];
            edges.push((a, b, key(a, quantum), key(b, quantum)));
        }
    }
    if edges.is_empty() {
        return None;
    }

    let directed: HashSet<(Key, Key)> = edges.iter().map(|e| (e.2, e.3)).collect();
    let outer: Vec<&(Coord, Coord, Key, Key)> = edges
        .iter()
        .filter(|e| !directed.contains(&(e.3, e.2)))
        .collect();
    if outer.len() < 3 {
        return None;
    }

    let mut by_start: HashMap<Key, Vec<usize>> = HashMap::new();
    for (idx, e) in outer.iter().enumerate() {
        by_start.entry(e.2).or_default().push(idx);
    }

    let mut used = vec![false; outer.len()];
    let start_key = outer[0].2;
    let mut points = vec![outer[0].0];
    let mut current = 0usize;
    used[0] = true;
    let max_steps = edges.len() * 2;
    let mut closed = false;
    for _ in 0..max_steps {
        let end_key = outer[current].3;
        if end_key == start_key {
            closed = true;
            break;
        }
        let next = by_start
            .get(&end_key)
            .and_then(|cands| cands.iter().copied().find(|&c| !used[c]))?;
        used[next] = true;
        points.push(outer[next].0);
        current = next;
    }
    if !closed || points.len() < 3 {
        return None;
    }
    let visited = used.iter().filter(|u| **u).count();
    if visited != outer.len() {
        debug!(visited, total = outer.len(), "edge walk left unvisited edges");
        return None;
    }
    Some(closed_ring(&points, cfg.eps))
}

/// Merge rings into one closed outer ring: fast edge walk first, robust
/// union as fallback.
pub fn merge_rings(
    rings: &[Vec<Coord>],
    cfg: GeomCfg,
    ops: &dyn PolygonSetOps,
) -> Result<Vec<Coord>, MergeError> {
    match rings {
        [] => return Err(MergeError::Empty),
        [single] => {
            let open = open_ring(single, cfg.eps);
            if open.len() < 3 {
                return Err(MergeError::Degenerate);
            }
            return Ok(ccw(&closed_ring(open, cfg.eps)));
        }
        _ => {}
    }
    if let Some(ring) = merge_rings_by_edges(rings, cfg) {
        if !is_ring_self_intersecting(&ring, cfg) {
            return Ok(ring);
        }
        debug!("edge walk produced a self-touching ring, falling back to union");
    }
    let shapes = ops.union(rings);
    match shapes.as_slice() {
        [] => Err(MergeError::Degenerate),
        [shape] if !shape.holes.is_empty() => Err(MergeError::Hole),
        [shape] => {
            let open = dedup_consecutive(open_ring(&shape.exterior, cfg.eps), cfg.eps);
            if open.len() < 3 {
                return Err(MergeError::Degenerate);
            }
            Ok(ccw(&closed_ring(&open, cfg.eps)))
        }
        many => Err(MergeError::Disjoint(many.len())),
    }
}
