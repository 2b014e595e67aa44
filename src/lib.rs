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

//! Surface-water catchments over a triangulated irregular network.
//!
//! The crate is organised bottom-up: `geometry` and `kernel` hold the planar
//! primitives and robust predicates, `mesh` holds the half-edge [`Tin`] that
//! every algorithm walks and edits, and `drainage` holds the flow tracing,
//! colouring, polygon extraction and ridge-line refinement built on top.
//!
//! The two entry points are [`determine_catchments`] for a whole-mesh
//! decomposition and [`catchment_at`] for a single location.

pub mod config;
pub mod drainage;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod mesh;

pub use config::{CancelToken, DrainageConfig};
pub use drainage::api::{
    CatchmentFeature, CatchmentSummary, PointCatchment, catchment_at, determine_catchments,
};
pub use drainage::extract::CatchmentPolygon;
pub use drainage::fence::{ActiveFence, Fence, FenceMode, FenceSpec};
pub use drainage::index::{CatchmentId, SumpLineType};
pub use error::{DrainageError, Result};
pub use geometry::{Point2, Point3};
pub use mesh::{FeatureKind, Tin, TinState, Tolerances};
