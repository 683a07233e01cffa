//! Minimap model: a fixed-size, per-axis scaled overview of the whole grid.

use crate::id::NodeId;
use crate::model::NodeRect;
use crate::viewport::ViewTransform;
use kurbo::{Point, Size};
use std::collections::HashMap;

/// Smallest drawn viewport rectangle, in minimap pixels.
pub const MIN_VIEWPORT_SIZE: f64 = 4.0;

/// Everything needed to draw one minimap frame, in minimap pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapModel {
    pub size: Size,
    /// One dot per node, at the node's scaled center.
    pub dots: Vec<(NodeId, Point)>,
    /// One faint line per connection, between endpoint dots.
    pub lines: Vec<(Point, Point)>,
    pub viewport: NodeRect,
}

/// Canvas → minimap scale factors, independent per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapScale {
    pub x: f64,
    pub y: f64,
}

impl MinimapScale {
    pub fn new(minimap: Size, grid: Size) -> Self {
        let ratio = |m: f64, g: f64| if g > 0.0 { m / g } else { 0.0 };
        Self {
            x: ratio(minimap.width, grid.width),
            y: ratio(minimap.height, grid.height),
        }
    }

    pub fn to_minimap(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.x, canvas.y * self.y)
    }

    /// Inverse of `to_minimap`; degenerate axes map to 0.
    pub fn to_canvas(&self, minimap: Point) -> Point {
        let inv = |v: f64, s: f64| if s > 0.0 { v / s } else { 0.0 };
        Point::new(inv(minimap.x, self.x), inv(minimap.y, self.y))
    }
}

/// Build the minimap frame from node rectangles and connection endpoints.
pub fn build_minimap(
    size: Size,
    transform: &ViewTransform,
    nodes: &[(NodeId, NodeRect)],
    connections: &[(NodeId, NodeId)],
) -> MinimapModel {
    let scale = MinimapScale::new(size, transform.grid());

    let dots: Vec<(NodeId, Point)> = nodes
        .iter()
        .map(|(id, r)| (*id, scale.to_minimap(r.center())))
        .collect();

    let centers: HashMap<NodeId, Point> = dots.iter().copied().collect();
    let lines = connections
        .iter()
        .filter_map(|(s, t)| Some((*centers.get(s)?, *centers.get(t)?)))
        .collect();

    let visible = transform.visible_rect();
    let origin = scale.to_minimap(Point::new(visible.x, visible.y));
    let viewport = NodeRect::new(
        origin.x,
        origin.y,
        (visible.width * scale.x).max(MIN_VIEWPORT_SIZE),
        (visible.height * scale.y).max(MIN_VIEWPORT_SIZE),
    );

    MinimapModel {
        size,
        dots,
        lines,
        viewport,
    }
}

/// Recenter the main view on the canvas point under a minimap click,
/// keeping the current scale.
pub fn navigate(transform: &mut ViewTransform, minimap_size: Size, click: Point) {
    let scale = MinimapScale::new(minimap_size, transform.grid());
    let target = scale.to_canvas(click);
    log::trace!("minimap click ({}, {}) → canvas ({}, {})", click.x, click.y, target.x, target.y);
    transform.center_on(target);
}
