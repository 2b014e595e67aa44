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

use ahash::AHashMap;

use crate::{
    drainage::scan::ScanPool,
    mesh::{face::Face, half_edge::HalfEdge, vertex::Vertex},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TinState {
    Empty,
    /// Points loaded, no triangles yet.
    Points,
    Triangulated,
}

/// Mesh-global snapping tolerances, shared by every edit on the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Two points closer than this (in plan) are the same point.
    pub point: f64,
    /// A point closer than this to a line lies on it.
    pub line: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            point: 1e-6,
            line: 1e-7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Breakline,
    /// Maximum-ascent line inserted by the boundary refiner.
    AscentLine,
    /// Output kind of extracted catchment polygons.
    Catchment,
}

/// A polyline over mesh vertices. Edge splits keep it connected by
/// inserting the new vertex between the two it separated.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub vertices: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Tin {
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,

    pub edge_map: AHashMap<(usize, usize), usize>,
    pub features: Vec<Feature>,
    pub tolerances: Tolerances,

    pub(crate) state: TinState,
    pub(crate) scans: ScanPool,
}
