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

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::{DrainageError, Result};

/// Numeric knobs for tracing, colouring and refinement.
///
/// Point-to-point and point-to-line snapping tolerances are not here: they
/// belong to the mesh (see [`crate::Tolerances`]) because every edit on the
/// mesh has to agree on them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainageConfig {
    /// Ponds shallower than this are filled and spilled over instead of
    /// terminating a trace.
    pub max_pond_depth: f64,
    /// Local minima shallower than this are stepped over during descent.
    pub false_low_depth: f64,
    /// Elevation (and slope) difference treated as level.
    pub flat_tolerance: f64,
    /// Edge samples sit this fraction of the way from an edge midpoint to the
    /// triangle centroid.
    pub sample_offset: f64,
    pub max_refine_iterations: usize,
    pub max_ascent_lines_per_pass: usize,
    /// Vertices one refinement pass may add before its remaining ascent
    /// lines are dropped.
    pub max_vertices_per_pass: usize,
    /// Vertices a whole refinement run may add.
    pub max_refine_vertices: usize,
    /// Run the boundary refiner after the first colouring.
    pub refine: bool,
}

impl Default for DrainageConfig {
    fn default() -> Self {
        Self {
            max_pond_depth: 0.0,
            false_low_depth: 0.0,
            flat_tolerance: 1e-9,
            sample_offset: 0.25,
            max_refine_iterations: 8,
            max_ascent_lines_per_pass: 64,
            max_vertices_per_pass: 256,
            max_refine_vertices: 2048,
            refine: true,
        }
    }
}

impl DrainageConfig {
    pub fn with_max_pond_depth(mut self, depth: f64) -> Self {
        self.max_pond_depth = depth.max(0.0);
        self
    }

    pub fn with_false_low_depth(mut self, depth: f64) -> Self {
        self.false_low_depth = depth.max(0.0);
        self
    }

    pub fn with_flat_tolerance(mut self, tol: f64) -> Self {
        self.flat_tolerance = tol.abs();
        self
    }

    pub fn with_sample_offset(mut self, offset: f64) -> Self {
        self.sample_offset = offset.clamp(0.01, 0.99);
        self
    }

    pub fn with_max_refine_iterations(mut self, iterations: usize) -> Self {
        self.max_refine_iterations = iterations;
        self
    }

    pub fn with_max_ascent_lines_per_pass(mut self, lines: usize) -> Self {
        self.max_ascent_lines_per_pass = lines;
        self
    }

    pub fn with_max_vertices_per_pass(mut self, vertices: usize) -> Self {
        self.max_vertices_per_pass = vertices;
        self
    }

    pub fn with_max_refine_vertices(mut self, vertices: usize) -> Self {
        self.max_refine_vertices = vertices;
        self
    }

    pub fn with_refine(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }
}

/// Cooperative cancellation flag shared between a caller and a running
/// drainage operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DrainageError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert_eq!(token.check(), Err(DrainageError::Cancelled));
    }

    #[test]
    fn setters_clamp_inputs() {
        let cfg = DrainageConfig::default()
            .with_max_pond_depth(-1.0)
            .with_sample_offset(5.0);
        assert_eq!(cfg.max_pond_depth, 0.0);
        assert_eq!(cfg.sample_offset, 0.99);
    }
}
