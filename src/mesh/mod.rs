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

//! Half-edge TIN: the mesh topology every drainage algorithm walks and edits.
//!
//! Faces are stored anticlockwise. Border half-edges (`face == None`) run
//! clockwise around the outside and are linked into a single hull loop, so
//! rotating around any vertex (`twin(prev(h))`) works the same on the hull
//! and in the interior.

pub mod basic_types;
pub mod core;
pub mod face;
pub mod half_edge;
pub mod split;
pub mod topology;
pub mod vertex;

pub use basic_types::{Feature, FeatureKind, Tin, TinState, Tolerances};
pub use face::Face;
pub use half_edge::HalfEdge;
pub use vertex::Vertex;
