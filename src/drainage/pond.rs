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

use ahash::AHashSet;
use log::trace;

use crate::{
    drainage::scan::{ScanSession, ScanSlot},
    error::Result,
    mesh::Tin,
};

/// A depression around a local minimum and the vertex it spills over.
#[derive(Debug, Clone, PartialEq)]
pub struct PondOutlet {
    pub spill: usize,
    /// Spill elevation above the minimum.
    pub depth: f64,
    /// Vertices of the flooded triangles.
    pub members: AHashSet<usize>,
}

/// Floods outward from `sump` (scan slot B) one rim vertex at a time, always
/// at the lowest rim vertex, until the water can leave: the rim vertex is on
/// the hull, touches a blocked triangle, or has a lower neighbour outside the
/// pond. Gives up with `None` once the water is `max_depth` deep or the
/// flood cannot grow.
pub fn measure_pond<B>(tin: &Tin, sump: usize, max_depth: f64, blocked: B) -> Result<Option<PondOutlet>>
where
    B: Fn(usize) -> bool,
{
    let z0 = tin.position(sump).z();
    let mut pond = ScanSession::open(tin, ScanSlot::B)?;
    if pond.start_around_vertex(sump, |f| !blocked(f))?.is_none() {
        return Ok(None);
    }

    loop {
        let Some(rim) = pond.vertices().into_iter().min_by(|&a, &b| {
            tin.position(a)
                .z()
                .total_cmp(&tin.position(b).z())
                .then(a.cmp(&b))
        }) else {
            return Ok(None);
        };
        let level = tin.position(rim).z();
        let members = pond.members();

        let spills = tin.is_hull_vertex(rim)
            || tin.faces_around_vertex(rim).iter().any(|&f| blocked(f))
            || tin
                .neighbors_ccw(rim)
                .iter()
                .any(|&n| !members.contains(&n) && tin.position(n).z() < level);
        if spills {
            if rim == sump {
                return Ok(None);
            }
            trace!("pond at {sump} spills over {rim} at depth {}", level - z0);
            return Ok(Some(PondOutlet {
                spill: rim,
                depth: level - z0,
                members,
            }));
        }
        if level - z0 >= max_depth {
            return Ok(None);
        }

        let mut grew = false;
        loop {
            let mut absorbed = false;
            for f in tin.faces_around_vertex(rim) {
                if !pond.contains_face(f) && !blocked(f) && pond.absorb(f)? {
                    absorbed = true;
                }
            }
            if !absorbed {
                break;
            }
            grew = true;
        }
        if !grew {
            return Ok(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_pit_spills_over_lowest_rim() {
        // a pit at the centre of a slope falling toward x = 0
        let tin = Tin::from_grid(4, 4, 1.0, |x, y| {
            if x == 2.0 && y == 2.0 { 0.5 } else { x }
        })
        .unwrap();
        let centre = 2 * 5 + 2;
        let outlet = measure_pond(&tin, centre, 10.0, |_| false)
            .unwrap()
            .unwrap();
        assert!((outlet.depth - 0.5).abs() < 1e-12);
        assert!((tin.position(outlet.spill).x() - 1.0).abs() < 1e-12);
        assert!(tin.scans_idle());
    }

    #[test]
    fn deep_pit_is_not_a_pond() {
        let tin = Tin::from_grid(4, 4, 1.0, |x, y| {
            if x == 2.0 && y == 2.0 { -5.0 } else { 0.0 }
        })
        .unwrap();
        assert!(measure_pond(&tin, 12, 1.0, |_| false).unwrap().is_none());
    }
}
