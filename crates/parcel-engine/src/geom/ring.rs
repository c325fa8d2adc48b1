//! Ring and polyline helpers: closing, opening, orientation, measures.
//!
//! Conventions
//! - A ring is closed when its first and last coordinates coincide (within
//!   `eps`) and it has at least 4 coordinates.
//! - "Open form" drops the duplicated closing coordinate.

use super::types::Coord;

/// Minimum coordinate count of a closed ring (triangle + closing point).
pub const MIN_CLOSED_RING_LEN: usize = 4;

#[inline]
pub fn points_equal(a: Coord, b: Coord, eps: f64) -> bool {
    (a - b).norm() <= eps
}

/// First equals last and at least 4 coordinates.
pub fn is_closed(ring: &[Coord], eps: f64) -> bool {
    ring.len() >= MIN_CLOSED_RING_LEN && points_equal(ring[0], ring[ring.len() - 1], eps)
}

/// Slice without the duplicated closing coordinate (if present).
pub fn open_ring(ring: &[Coord], eps: f64) -> &[Coord] {
    if ring.len() >= 2 && points_equal(ring[0], ring[ring.len() - 1], eps) {
        &ring[..ring.len() - 1]
    } else {
        ring
    }
}

/// Return a closed copy: appends the first coordinate unless already closed.
pub fn closed_ring(points: &[Coord], eps: f64) -> Vec<Coord> {
    let mut out = points.to_vec();
    close_in_place(&mut out, eps);
    out
}

/// Append the first coordinate if the sequence is not already closed.
pub fn close_in_place(points: &mut Vec<Coord>, eps: f64) {
    if let Some(&first) = points.first() {
        let last = points[points.len() - 1];
        if points.len() < 2 || !points_equal(first, last, eps) {
            points.push(first);
        } else {
            // snap the closing point exactly onto the first
            let n = points.len();
            points[n - 1] = first;
        }
    }
}

/// Drop consecutive duplicates (within `eps`), keeping the ring's closing pair.
pub fn dedup_consecutive(points: &[Coord], eps: f64) -> Vec<Coord> {
    let mut out: Vec<Coord> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_none_or(|&q| !points_equal(p, q, eps)) {
            out.push(p);
        }
    }
    out
}

/// Signed shoelace area; positive for counter-clockwise rings.
/// Works on open or closed input.
pub fn signed_area(ring: &[Coord]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

/// Unsigned polygon area (m² in the working CRS).
#[inline]
pub fn ring_area(ring: &[Coord]) -> f64 {
    signed_area(ring).abs()
}

/// Total length of an open polyline.
pub fn line_length(line: &[Coord]) -> f64 {
    line.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Copy of the ring oriented counter-clockwise (closing point preserved).
pub fn ccw(ring: &[Coord]) -> Vec<Coord> {
    let mut out = ring.to_vec();
    if signed_area(ring) < 0.0 {
        out.reverse();
    }
    out
}

/// Iterate the edges `(index, start, end)` of a ring given in open or closed form.
/// For open input the wrap-around edge is included.
pub fn ring_edges(ring: &[Coord], eps: f64) -> impl Iterator<Item = (usize, Coord, Coord)> + '_ {
    let open = open_ring(ring, eps);
    let n = open.len();
    let count = if n >= 2 { n } else { 0 };
    (0..count).map(move |i| (i, open[i], open[(i + 1) % n]))
}

/// Midpoints of every edge of a ring.
pub fn edge_midpoints(ring: &[Coord], eps: f64) -> Vec<Coord> {
    ring_edges(ring, eps).map(|(_, a, b)| (a + b) * 0.5).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn tri() -> Vec<Coord> {
        vec![
            vector![10.0, 10.0],
            vector![90.0, 10.0],
            vector![50.0, 90.0],
        ]
    }

    #[test]
    fn shoelace_triangle_area() {
        let r = closed_ring(&tri(), 1e-3);
        assert_eq!(r.len(), 4);
        assert!(is_closed(&r, 1e-3));
        assert!((ring_area(&r) - 3200.0).abs() < 1e-9);
    }

    #[test]
    fn orientation_and_open_form() {
        let mut cw = tri();
        cw.reverse();
        let closed = closed_ring(&cw, 1e-3);
        assert!(signed_area(&closed) < 0.0);
        let fixed = ccw(&closed);
        assert!(signed_area(&fixed) > 0.0);
        assert_eq!(open_ring(&fixed, 1e-3).len(), 3);
        assert_eq!(ring_edges(&fixed, 1e-3).count(), 3);
    }

    #[test]
    fn close_in_place_snaps_near_duplicate() {
        let mut r = tri();
        r.push(vector![10.0004, 10.0]);
        close_in_place(&mut r, 1e-3);
        assert_eq!(r.len(), 4);
        assert_eq!(r[3], r[0]);
    }

    #[test]
    fn dedup_drops_repeated_clicks() {
        let pts = vec![vector![0.0, 0.0], vector![0.0, 0.0], vector![1.0, 0.0]];
        assert_eq!(dedup_consecutive(&pts, 1e-3).len(), 2);
        assert!((line_length(&pts) - 1.0).abs() < 1e-12);
    }
}
