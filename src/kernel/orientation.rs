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

use std::cmp::Ordering;

use rug::Rational;

use crate::geometry::{Point2, Point3};

/// Anything with planar coordinates.
pub trait Planar {
    fn px(&self) -> f64;
    fn py(&self) -> f64;
}

impl Planar for Point2 {
    #[inline]
    fn px(&self) -> f64 {
        self.coords[0]
    }
    #[inline]
    fn py(&self) -> f64 {
        self.coords[1]
    }
}

impl Planar for Point3 {
    #[inline]
    fn px(&self) -> f64 {
        self.coords[0]
    }
    #[inline]
    fn py(&self) -> f64 {
        self.coords[1]
    }
}

impl Planar for (f64, f64) {
    #[inline]
    fn px(&self) -> f64 {
        self.0
    }
    #[inline]
    fn py(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Clockwise,
    Collinear,
    CounterClockwise,
}

impl Orientation {
    pub fn is_ccw(self) -> bool {
        self == Orientation::CounterClockwise
    }

    pub fn is_cw(self) -> bool {
        self == Orientation::Clockwise
    }

    pub fn is_collinear(self) -> bool {
        self == Orientation::Collinear
    }

    fn from_ordering(o: Ordering) -> Self {
        match o {
            Ordering::Greater => Orientation::CounterClockwise,
            Ordering::Less => Orientation::Clockwise,
            Ordering::Equal => Orientation::Collinear,
        }
    }
}

/// Returns:
/// - >0 if counter-clockwise
/// - <0 if clockwise
/// - =0 if collinear
///
/// Plain floating point evaluation; see [`orientation`] for the robust sign.
#[inline]
pub fn orient2d<P: Planar, Q: Planar, R: Planar>(a: &P, b: &Q, c: &R) -> f64 {
    (b.px() - a.px()) * (c.py() - a.py()) - (b.py() - a.py()) * (c.px() - a.px())
}

// (3 + 16 eps) * eps, eps = 2^-53
const CCW_ERR_BOUND: f64 = 3.330_669_073_875_471_6e-16;

/// Robust orientation of `c` relative to the directed line `a -> b`.
///
/// The floating determinant is trusted when it clears the forward error
/// bound; otherwise the sign is recomputed exactly with GMP rationals so
/// that near-degenerate configurations (a ray passing exactly through a
/// vertex) always classify the same way.
pub fn orientation<P: Planar, Q: Planar, R: Planar>(a: &P, b: &Q, c: &R) -> Orientation {
    let detleft = (a.px() - c.px()) * (b.py() - c.py());
    let detright = (a.py() - c.py()) * (b.px() - c.px());
    let det = detleft - detright;
    let detsum = detleft.abs() + detright.abs();

    if det.abs() > CCW_ERR_BOUND * detsum {
        return Orientation::from_ordering(det.partial_cmp(&0.0).unwrap_or(Ordering::Equal));
    }
    orientation_exact(a, b, c)
}

/// Exact sign of the orientation determinant.
pub fn orientation_exact<P: Planar, Q: Planar, R: Planar>(a: &P, b: &Q, c: &R) -> Orientation {
    let to_q = |v: f64| Rational::from_f64(v).unwrap_or_default();

    let (ax, ay) = (to_q(a.px()), to_q(a.py()));
    let (bx, by) = (to_q(b.px()), to_q(b.py()));
    let (cx, cy) = (to_q(c.px()), to_q(c.py()));

    let dx1 = Rational::from(&bx - &ax);
    let dy1 = Rational::from(&by - &ay);
    let dx2 = Rational::from(&cx - &ax);
    let dy2 = Rational::from(&cy - &ay);

    let det = Rational::from(&dx1 * &dy2) - Rational::from(&dy1 * &dx2);
    Orientation::from_ordering(det.cmp0())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_test() {
        let a = Point2::xy(0.0, 0.0);
        let b = Point2::xy(1.0, 0.0);
        let c = Point2::xy(0.0, 1.0);

        assert!(orient2d(&a, &b, &c) > 0.0);
        assert_eq!(orientation(&a, &b, &c), Orientation::CounterClockwise);
        assert_eq!(orientation(&a, &c, &b), Orientation::Clockwise);
    }

    #[test]
    fn near_collinear_uses_exact_sign() {
        // classic failure case for naive evaluation
        let a = Point2::xy(0.5, 0.5);
        let b = Point2::xy(12.0, 12.0);
        let c = Point2::xy(24.0, 24.0);
        assert_eq!(orientation(&a, &b, &c), Orientation::Collinear);

        let c_up = Point2::xy(24.0, f64::from_bits(24.0f64.to_bits() + 1));
        assert_eq!(orientation(&a, &b, &c_up), Orientation::CounterClockwise);
    }
}
