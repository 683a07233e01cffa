//! Hit testing: canvas point → node / connection lookup.
//!
//! Nodes are checked front to back (last added = topmost). Connections are
//! hit through a widened invisible band around their drawn path.

use crate::id::{ConnectionId, NodeId};
use crate::model::NodeRect;
use crate::registry::NodeRegistry;
use crate::route::Route;
use kurbo::Point;

/// Find the topmost node containing `p`.
pub fn node_at(registry: &NodeRegistry, p: Point) -> Option<NodeId> {
    registry
        .node_ids()
        .iter()
        .rev()
        .copied()
        .find(|&id| registry.node_rect(id).is_some_and(|r| r.contains(p)))
}

/// All nodes whose rectangle intersects `area`, back to front.
/// Used for rubber-band selection.
pub fn nodes_in_rect(registry: &NodeRegistry, area: &NodeRect) -> Vec<NodeId> {
    registry
        .all_node_rects()
        .into_iter()
        .filter(|(_, r)| r.intersects(area))
        .map(|(id, _)| id)
        .collect()
}

/// Find the topmost connection whose hit band (`hit_width` wide, centred on
/// the path) contains `p`.
pub fn connection_at<'a>(
    routes: impl DoubleEndedIterator<Item = (ConnectionId, &'a Route)>,
    p: Point,
    hit_width: f64,
) -> Option<ConnectionId> {
    let tolerance = hit_width / 2.0;
    routes
        .rev()
        .find(|(_, route)| route.distance_to(p) <= tolerance)
        .map(|(id, _)| id)
}
