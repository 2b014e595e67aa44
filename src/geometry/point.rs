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

use std::{
    array::from_fn,
    ops::{Index, IndexMut},
};

use num_traits::Float;

use crate::geometry::vector::Vector;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T, const N: usize> {
    pub coords: [T; N],
}

pub type Point2 = Point<f64, 2>;
pub type Point3 = Point<f64, 3>;

impl<T: Float, const N: usize> Default for Point<T, N> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<T: Float, const N: usize> Point<T, N> {
    pub fn new(coords: [T; N]) -> Self {
        Self { coords }
    }

    pub fn origin() -> Self {
        Self {
            coords: [T::zero(); N],
        }
    }

    pub fn vector_to(&self, other: &Self) -> Vector<T, N> {
        Vector::new(from_fn(|i| other.coords[i] - self.coords[i]))
    }

    pub fn add_vector(&self, v: &Vector<T, N>) -> Self {
        Self {
            coords: from_fn(|i| self.coords[i] + v.coords[i]),
        }
    }

    /// Linear interpolation, `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(&self, other: &Self, t: T) -> Self {
        Self {
            coords: from_fn(|i| self.coords[i] + (other.coords[i] - self.coords[i]) * t),
        }
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        let two = T::one() + T::one();
        self.lerp(other, T::one() / two)
    }

    pub fn distance_squared(&self, other: &Self) -> T {
        self.vector_to(other).norm_squared()
    }

    pub fn distance(&self, other: &Self) -> T {
        self.distance_squared(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }
}

impl<T: Float> Point<T, 2> {
    pub fn xy(x: T, y: T) -> Self {
        Self { coords: [x, y] }
    }

    #[inline]
    pub fn x(&self) -> T {
        self.coords[0]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.coords[1]
    }

    /// Lifts the point onto the given elevation.
    pub fn with_z(&self, z: T) -> Point<T, 3> {
        Point::xyz(self.coords[0], self.coords[1], z)
    }
}

impl<T: Float> Point<T, 3> {
    pub fn xyz(x: T, y: T, z: T) -> Self {
        Self { coords: [x, y, z] }
    }

    #[inline]
    pub fn x(&self) -> T {
        self.coords[0]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.coords[1]
    }

    #[inline]
    pub fn z(&self) -> T {
        self.coords[2]
    }

    /// Drops the elevation.
    pub fn planar(&self) -> Point<T, 2> {
        Point::xy(self.coords[0], self.coords[1])
    }

    /// Horizontal distance, ignoring elevation.
    pub fn planar_distance(&self, other: &Self) -> T {
        let dx = other.coords[0] - self.coords[0];
        let dy = other.coords[1] - self.coords[1];
        dx.hypot(dy)
    }

    /// True when both points share x and y within `tol`.
    pub fn planar_eq(&self, other: &Self, tol: T) -> bool {
        self.planar_distance(other) <= tol
    }
}

impl<T, const N: usize> Index<usize> for Point<T, N> {
    type Output = T;
    fn index(&self, i: usize) -> &Self::Output {
        &self.coords[i]
    }
}

impl<T, const N: usize> IndexMut<usize> for Point<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.coords[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_and_midpoint_agree() {
        let a = Point3::xyz(0.0, 0.0, 0.0);
        let b = Point3::xyz(2.0, 4.0, 6.0);
        assert_eq!(a.midpoint(&b), a.lerp(&b, 0.5));
        assert_eq!(a.midpoint(&b), Point3::xyz(1.0, 2.0, 3.0));
    }

    #[test]
    fn planar_distance_ignores_z() {
        let a = Point3::xyz(0.0, 0.0, 10.0);
        let b = Point3::xyz(3.0, 4.0, -5.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-12);
        assert!(a.distance(&b) > 5.0);
    }
}
