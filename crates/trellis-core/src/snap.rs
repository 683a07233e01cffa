//! Alignment snapping for single-node drags.
//!
//! The dragged rectangle's start/end/center edges are compared against every
//! stationary node's edges, axis by axis. The first match within the
//! threshold wins on each axis; later candidates are never consulted even if
//! closer. Thresholds are in canvas units so the snap feel does not change
//! with zoom.

use crate::model::NodeRect;
use serde::Serialize;
use smallvec::SmallVec;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    /// Constant x, drawn top to bottom.
    Vertical,
    /// Constant y, drawn left to right.
    Horizontal,
}

/// A visible alignment line in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapGuide {
    pub axis: GuideAxis,
    /// The shared coordinate (x for vertical, y for horizontal).
    pub position: f64,
    /// Extent along the other axis, covering both rectangles.
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    pub guides: SmallVec<[SnapGuide; 2]>,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
    Center,
}

/// Every edge against every edge, in priority order: like-for-like first,
/// then abutting, then center against an edge.
const PAIRS: [(Edge, Edge); 9] = [
    (Edge::Start, Edge::Start),
    (Edge::End, Edge::End),
    (Edge::Center, Edge::Center),
    (Edge::Start, Edge::End),
    (Edge::End, Edge::Start),
    (Edge::Center, Edge::Start),
    (Edge::Center, Edge::End),
    (Edge::Start, Edge::Center),
    (Edge::End, Edge::Center),
];

fn edge(start: f64, len: f64, e: Edge) -> f64 {
    match e {
        Edge::Start => start,
        Edge::End => start + len,
        Edge::Center => start + len / 2.0,
    }
}

/// Returns the snapped start coordinate and the matched line, if any.
fn snap_axis<'a>(
    start: f64,
    len: f64,
    candidates: impl Iterator<Item = (f64, f64, &'a NodeRect)>,
    threshold: f64,
) -> Option<(f64, f64, &'a NodeRect)> {
    for (c_start, c_len, rect) in candidates {
        for (mine, theirs) in PAIRS {
            let line = edge(c_start, c_len, theirs);
            if (edge(start, len, mine) - line).abs() <= threshold {
                let snapped = match mine {
                    Edge::Start => line,
                    Edge::End => line - len,
                    Edge::Center => line - len / 2.0,
                };
                return Some((snapped, line, rect));
            }
        }
    }
    None
}

/// Snap `proposed` against `others`.
pub fn compute_snap(proposed: NodeRect, others: &[NodeRect], threshold: f64) -> SnapResult {
    let hit_x = snap_axis(
        proposed.x,
        proposed.width,
        others.iter().map(|r| (r.x, r.width, r)),
        threshold,
    );
    let hit_y = snap_axis(
        proposed.y,
        proposed.height,
        others.iter().map(|r| (r.y, r.height, r)),
        threshold,
    );

    let x = hit_x.map_or(proposed.x, |(x, _, _)| x);
    let y = hit_y.map_or(proposed.y, |(y, _, _)| y);
    let snapped = NodeRect::new(x, y, proposed.width, proposed.height);

    let mut guides = SmallVec::new();
    if let Some((_, line, other)) = hit_x {
        guides.push(SnapGuide {
            axis: GuideAxis::Vertical,
            position: line,
            start: snapped.y.min(other.y),
            end: snapped.bottom().max(other.bottom()),
        });
    }
    if let Some((_, line, other)) = hit_y {
        guides.push(SnapGuide {
            axis: GuideAxis::Horizontal,
            position: line,
            start: snapped.x.min(other.x),
            end: snapped.right().max(other.right()),
        });
    }
    if !guides.is_empty() {
        log::trace!("snap ({}, {}) → ({x}, {y})", proposed.x, proposed.y);
    }

    SnapResult { x, y, guides }
}
