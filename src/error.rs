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

//! Unified error type for the drainage core.
//!
//! Every public operation returns [`Result`]. Variants are grouped by the
//! failure category they belong to: preconditions are checked before any
//! mesh edit, algorithmic failures abort the current operation after the
//! scan links have been released, and cancellation is cooperative.

use thiserror::Error;

use crate::drainage::scan::ScanSlot;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrainageError {
    /// The mesh has points but no triangulation (or nothing at all).
    #[error("mesh is not triangulated")]
    NotTriangulated,
    #[error("vertex {0} does not exist")]
    InvalidVertex(usize),
    #[error("face {0} does not exist")]
    InvalidFace(usize),
    #[error("no edge between vertices {0} and {1}")]
    MissingEdge(usize, usize),
    /// Raised while building a [`crate::Tin`] from caller supplied triangles.
    #[error("invalid triangulation: {0}")]
    InvalidTriangulation(String),

    /// A trace that must end in a sump ran out of downhill directions
    /// without reaching one.
    #[error("no drain point found")]
    NoDrainPoint,
    #[error("temporary polygon is no longer a closed cycle")]
    PolygonDisconnected,
    #[error("temporary polygon area decreased from {before} to {after}")]
    PolygonReversed { before: f64, after: f64 },
    #[error("temporary polygon lost its start handle")]
    StartHandleLost,
    #[error("catchment {id} produced a degenerate ring of {points} points")]
    DegeneratePolygon { id: usize, points: usize },
    /// An ascent step would have gone downhill.
    #[error("ascent line descended from z={from} to z={to}")]
    AscentDescended { from: f64, to: f64 },
    #[error("scan slot {0:?} is already in use")]
    ScanSlotBusy(ScanSlot),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DrainageError>;
