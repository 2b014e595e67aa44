// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Planar ring helpers. Rings are slices of 3D points; only x and y take
//! part in the computations. A ring may be given open or closed (first point
//! repeated at the end), both produce the same results.

use crate::geometry::{Point2, Point3};

fn open_len(ring: &[Point3]) -> usize {
    if ring.len() > 1 && is_closed(ring) {
        ring.len() - 1
    } else {
        ring.len()
    }
}

/// True when the first and last points coincide exactly.
pub fn is_closed(ring: &[Point3]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(a), Some(b)) => ring.len() > 1 && a == b,
        _ => false,
    }
}

/// Appends the first point if the ring is not closed yet.
pub fn close_ring(ring: &mut Vec<Point3>) {
    if !ring.is_empty() && !is_closed(ring) {
        let first = ring[0];
        ring.push(first);
    }
}

/// Shoelace area, positive for anticlockwise rings.
pub fn signed_area(ring: &[Point3]) -> f64 {
    let n = open_len(ring);
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        acc += a.x() * b.y() - b.x() * a.y();
    }
    acc * 0.5
}

pub fn signed_area_2d(ring: &[Point2]) -> f64 {
    let mut n = ring.len();
    if n > 1 && ring[0] == ring[n - 1] {
        n -= 1;
    }
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        acc += a.x() * b.y() - b.x() * a.y();
    }
    acc * 0.5
}

/// Number of distinct consecutive vertices (ignores the closing repeat).
pub fn distinct_vertex_count(ring: &[Point3]) -> usize {
    let n = open_len(ring);
    let mut count = 0;
    for i in 0..n {
        if i == 0 || ring[i] != ring[i - 1] {
            count += 1;
        }
    }
    count
}

/// Reverses the ring in place, keeping the closing point closed.
pub fn reverse_ring(ring: &mut [Point3]) {
    ring.reverse();
}

/// Even-odd point in polygon test on a 2D ring.
pub fn point_in_ring_2d(p: &Point2, ring: &[Point2]) -> bool {
    let mut n = ring.len();
    if n > 1 && ring[0] == ring[n - 1] {
        n -= 1;
    }
    if n < 3 {
        return false;
    }
    let (px, py) = (p.x(), p.y());
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].x(), ring[i].y());
        let (xj, yj) = (ring[j].x(), ring[j].y());
        if (yi > py) != (yj > py) {
            let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub fn point_in_ring(p: &Point2, ring: &[Point3]) -> bool {
    let flat: Vec<Point2> = ring.iter().map(|q| q.planar()).collect();
    point_in_ring_2d(p, &flat)
}

/// Area-weighted centroid of a ring; falls back to the vertex mean for
/// degenerate rings.
pub fn ring_centroid(ring: &[Point3]) -> Option<Point2> {
    let n = open_len(ring);
    if n == 0 {
        return None;
    }
    let area = signed_area(ring);
    if area.abs() <= f64::EPSILON {
        let (sx, sy) = ring[..n]
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x(), sy + p.y()));
        return Some(Point2::xy(sx / n as f64, sy / n as f64));
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        let cross = a.x() * b.y() - b.x() * a.y();
        cx += (a.x() + b.x()) * cross;
        cy += (a.y() + b.y()) * cross;
    }
    Some(Point2::xy(cx / (6.0 * area), cy / (6.0 * area)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3> {
        vec![
            Point3::xyz(0.0, 0.0, 0.0),
            Point3::xyz(2.0, 0.0, 0.0),
            Point3::xyz(2.0, 2.0, 0.0),
            Point3::xyz(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn area_sign_follows_winding() {
        let mut ring = square();
        assert!((signed_area(&ring) - 4.0).abs() < 1e-12);
        close_ring(&mut ring);
        assert!(is_closed(&ring));
        assert!((signed_area(&ring) - 4.0).abs() < 1e-12);
        reverse_ring(&mut ring);
        assert!((signed_area(&ring) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn point_in_square() {
        let ring = square();
        assert!(point_in_ring(&Point2::xy(1.0, 1.0), &ring));
        assert!(!point_in_ring(&Point2::xy(3.0, 1.0), &ring));
        let c = ring_centroid(&ring).unwrap();
        assert!((c.x() - 1.0).abs() < 1e-12 && (c.y() - 1.0).abs() < 1e-12);
    }
}
