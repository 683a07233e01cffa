//! Drag controller: `idle → dragging → idle`.
//!
//! A single-node drag snaps the node against every other node. When the
//! grabbed node belongs to a multi-node selection, every selected node is
//! moved by the same canvas delta and snapping is skipped so the group keeps
//! its relative layout exactly.
//!
//! Positions are always derived from the drag's start position plus the
//! total pointer displacement, never accumulated per event, so snapping
//! cannot "stick" and no intermediate position leaks into the final state.

use smallvec::SmallVec;
use trellis_core::registry::NodeRegistry;
use trellis_core::snap::{SnapGuide, compute_snap};
use trellis_core::{NodeId, NodeRect, Point};

#[derive(Debug, Clone)]
struct DragSession {
    node: NodeId,
    /// Pointer position at press, in screen pixels.
    origin: Point,
    /// Node position at press, in canvas units.
    start: Point,
    /// Other selected nodes and their start positions (group mode).
    group: Vec<(NodeId, Point)>,
    /// Set once the pointer leaves the click tolerance.
    moved: bool,
}

/// Result of a drag step, for the `node-drag-move` event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStep {
    pub node: NodeId,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    pub node: NodeId,
    pub x: f64,
    pub y: f64,
    /// False when the press never left the click tolerance.
    pub moved: bool,
}

/// Parameters that do not change during a drag.
#[derive(Debug, Clone, Copy)]
pub struct DragParams {
    pub scale: f64,
    pub snap_threshold: f64,
    /// Screen pixels the pointer must travel before the node moves.
    pub click_tolerance: f64,
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
    guides: SmallVec<[SnapGuide; 2]>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.node)
    }

    pub fn is_group(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.group.is_empty())
    }

    /// Snap guides to draw for the current frame.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    /// Start dragging `node`. Group mode is entered when `node` is part of a
    /// selection of more than one node. Returns the node's start position.
    pub fn begin(
        &mut self,
        registry: &NodeRegistry,
        node: NodeId,
        pointer: Point,
        selection: &[NodeId],
    ) -> Option<Point> {
        let start = registry.node_position(node)?;
        let group = if selection.len() > 1 && selection.contains(&node) {
            selection
                .iter()
                .filter(|&&id| id != node)
                .filter_map(|&id| registry.node_position(id).map(|p| (id, p)))
                .collect()
        } else {
            Vec::new()
        };
        log::trace!("drag start {node} (group of {})", group.len() + 1);
        self.session = Some(DragSession {
            node,
            origin: pointer,
            start,
            group,
            moved: false,
        });
        self.guides.clear();
        Some(start)
    }

    /// Apply the pointer at `pointer` (screen pixels). Returns `None` while
    /// idle, inside the click tolerance, or if the node vanished.
    pub fn update(
        &mut self,
        registry: &mut NodeRegistry,
        pointer: Point,
        params: DragParams,
    ) -> Option<DragStep> {
        let session = self.session.as_mut()?;
        let travel = pointer - session.origin;
        if !session.moved {
            if travel.hypot() <= params.click_tolerance {
                return None;
            }
            session.moved = true;
        }

        let delta = travel / params.scale;
        let proposed = session.start + delta;

        let (x, y) = if session.group.is_empty() {
            let rect = registry.node_rect(session.node)?;
            let moving = NodeRect::new(proposed.x, proposed.y, rect.width, rect.height);
            let others: Vec<NodeRect> = registry
                .all_node_rects()
                .into_iter()
                .filter(|(id, _)| *id != session.node)
                .map(|(_, r)| r)
                .collect();
            let snap = compute_snap(moving, &others, params.snap_threshold);
            self.guides = snap.guides;
            (snap.x, snap.y)
        } else {
            for (id, start) in &session.group {
                let p = *start + delta;
                registry.move_node(*id, p.x, p.y);
            }
            (proposed.x, proposed.y)
        };

        if !registry.move_node(session.node, x, y) {
            return None;
        }
        Some(DragStep {
            node: session.node,
            x,
            y,
            dx: x - session.start.x,
            dy: y - session.start.y,
        })
    }

    /// Finish the drag, clearing guides. The node keeps its last position.
    pub fn end(&mut self, registry: &NodeRegistry) -> Option<DragRelease> {
        let session = self.session.take()?;
        self.guides.clear();
        let pos = registry.node_position(session.node).unwrap_or(session.start);
        log::trace!("drag end {} at ({}, {})", session.node, pos.x, pos.y);
        Some(DragRelease {
            node: session.node,
            x: pos.x,
            y: pos.y,
            moved: session.moved,
        })
    }

    /// Abandon the drag without emitting anything (node removed, destroy).
    pub fn cancel(&mut self) {
        self.session = None;
        self.guides.clear();
    }

    /// True if `node` is being moved by the current drag.
    pub fn involves(&self, node: NodeId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.node == node || s.group.iter().any(|(id, _)| *id == node))
    }
}
