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

use std::array::from_fn;

use num_traits::Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector<T, const N: usize> {
    pub coords: [T; N],
}

pub type Vector2 = Vector<f64, 2>;
pub type Vector3 = Vector<f64, 3>;

impl<T: Float, const N: usize> Vector<T, N> {
    pub fn new(coords: [T; N]) -> Self {
        Self { coords }
    }

    pub fn zero() -> Self {
        Self {
            coords: [T::zero(); N],
        }
    }

    pub fn dot(&self, other: &Self) -> T {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .fold(T::zero(), |acc, (a, b)| acc + *a * *b)
    }

    pub fn norm_squared(&self) -> T {
        self.dot(self)
    }

    pub fn norm(&self) -> T {
        self.norm_squared().sqrt()
    }

    pub fn scale(&self, s: T) -> Self {
        Self {
            coords: from_fn(|i| self.coords[i] * s),
        }
    }

    /// Unit vector, or `None` for a zero-length input.
    pub fn normalized(&self) -> Option<Self> {
        let n = self.norm();
        if n > T::zero() && n.is_finite() {
            Some(self.scale(T::one() / n))
        } else {
            None
        }
    }

    pub fn neg(&self) -> Self {
        self.scale(-T::one())
    }
}

impl<T: Float> Vector<T, 2> {
    pub fn xy(x: T, y: T) -> Self {
        Self { coords: [x, y] }
    }

    /// Unit vector pointing at `angle` radians from the +x axis.
    pub fn from_angle(angle: T) -> Self {
        Self {
            coords: [angle.cos(), angle.sin()],
        }
    }

    /// z component of the 3D cross product.
    pub fn perp_dot(&self, other: &Self) -> T {
        self.coords[0] * other.coords[1] - self.coords[1] * other.coords[0]
    }

    /// Left-hand normal (rotated a quarter turn anticlockwise).
    pub fn perp(&self) -> Self {
        Self {
            coords: [-self.coords[1], self.coords[0]],
        }
    }

    pub fn angle(&self) -> T {
        self.coords[1].atan2(self.coords[0])
    }
}

impl<T: Float> Vector<T, 3> {
    pub fn xyz(x: T, y: T, z: T) -> Self {
        Self { coords: [x, y, z] }
    }

    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az] = self.coords;
        let [bx, by, bz] = other.coords;
        Self {
            coords: [ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx],
        }
    }

    pub fn planar(&self) -> Vector<T, 2> {
        Vector::xy(self.coords[0], self.coords[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_of_axes() {
        let x = Vector3::xyz(1.0, 0.0, 0.0);
        let y = Vector3::xyz(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3::xyz(0.0, 0.0, 1.0));
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(Vector2::zero().normalized().is_none());
        let v = Vector2::xy(3.0, 4.0).normalized().unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }
}
