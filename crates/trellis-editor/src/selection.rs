//! Selection set and rubber-band box selection.
//!
//! While a box is open every pointer move recomputes which nodes it touches
//! (the "would-select" highlight). Nothing is committed to the selection
//! until the box is released.

use trellis_core::hit::nodes_in_rect;
use trellis_core::registry::NodeRegistry;
use trellis_core::{NodeId, NodeRect, Point};

#[derive(Debug, Clone)]
struct BoxSession {
    start: Point,
    end: Point,
    pending: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    /// Selected nodes in the order they were selected.
    selected: Vec<NodeId>,
    rubber_band: Option<BoxSession>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flip one node's membership.
    pub fn toggle(&mut self, id: NodeId) {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    /// Replace the whole selection. Returns true if it changed.
    pub fn set(&mut self, ids: Vec<NodeId>) -> bool {
        let mut deduped: Vec<NodeId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        if same_members(&self.selected, &deduped) {
            return false;
        }
        self.selected = deduped;
        true
    }

    /// Returns true if anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Drop a node that no longer exists. Returns true if it was selected.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| *s != id);
        if let Some(band) = &mut self.rubber_band {
            band.pending.retain(|s| *s != id);
        }
        self.selected.len() != before
    }

    // ─── Rubber band ─────────────────────────────────────────────────────

    pub fn is_boxing(&self) -> bool {
        self.rubber_band.is_some()
    }

    /// Open a box at `start` (canvas units).
    pub fn begin_box(&mut self, start: Point) {
        self.rubber_band = Some(BoxSession {
            start,
            end: start,
            pending: Vec::new(),
        });
    }

    /// Stretch the box to `end` and refresh the would-select set.
    pub fn update_box(&mut self, registry: &NodeRegistry, end: Point) {
        if let Some(band) = &mut self.rubber_band {
            band.end = end;
            band.pending = nodes_in_rect(registry, &NodeRect::from_corners(band.start, band.end));
        }
    }

    /// Add every node touched by the box to the selection.
    /// Returns true if the selection changed.
    pub fn commit_box(&mut self) -> bool {
        let Some(band) = self.rubber_band.take() else {
            return false;
        };
        let mut changed = false;
        for id in band.pending {
            if !self.selected.contains(&id) {
                self.selected.push(id);
                changed = true;
            }
        }
        changed
    }

    pub fn cancel_box(&mut self) {
        self.rubber_band = None;
    }

    /// Current box in canvas units.
    pub fn box_rect(&self) -> Option<NodeRect> {
        self.rubber_band
            .as_ref()
            .map(|b| NodeRect::from_corners(b.start, b.end))
    }

    /// Nodes the open box would select if released now.
    pub fn pending(&self) -> &[NodeId] {
        match &self.rubber_band {
            Some(band) => &band.pending,
            None => &[],
        }
    }
}

fn same_members(a: &[NodeId], b: &[NodeId]) -> bool {
    a.len() == b.len() && a.iter().all(|id| b.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Handle, Size};

    fn n(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn registry() -> NodeRegistry {
        let mut reg = NodeRegistry::new(Size::new(220.0, 120.0));
        reg.add_node(n("sel_a"), Handle(1), 0.0, 0.0, serde_json::Value::Null);
        reg.add_node(n("sel_b"), Handle(2), 600.0, 0.0, serde_json::Value::Null);
        reg.add_node(n("sel_c"), Handle(3), 0.0, 300.0, serde_json::Value::Null);
        reg
    }

    #[test]
    fn box_highlights_live_and_commits_on_release() {
        let reg = registry();
        let mut sel = SelectionController::new();
        sel.begin_box(Point::new(-20.0, -20.0));
        sel.update_box(&reg, Point::new(100.0, 100.0));
        assert_eq!(sel.pending(), &[n("sel_a")]);
        assert!(sel.is_empty());

        sel.update_box(&reg, Point::new(250.0, 350.0));
        assert_eq!(sel.pending(), &[n("sel_a"), n("sel_c")]);

        assert!(sel.commit_box());
        assert_eq!(sel.selected(), &[n("sel_a"), n("sel_c")]);
        assert!(sel.box_rect().is_none());
    }

    #[test]
    fn box_is_additive() {
        let reg = registry();
        let mut sel = SelectionController::new();
        sel.toggle(n("sel_b"));
        sel.begin_box(Point::new(-20.0, -20.0));
        sel.update_box(&reg, Point::new(10.0, 10.0));
        sel.commit_box();
        assert_eq!(sel.selected(), &[n("sel_b"), n("sel_a")]);
    }

    #[test]
    fn box_drawn_backwards_is_normalized() {
        let reg = registry();
        let mut sel = SelectionController::new();
        sel.begin_box(Point::new(900.0, 50.0));
        sel.update_box(&reg, Point::new(700.0, 10.0));
        assert_eq!(sel.box_rect(), Some(NodeRect::new(700.0, 10.0, 200.0, 40.0)));
        assert_eq!(sel.pending(), &[n("sel_b")]);
    }

    #[test]
    fn toggle_and_set_report_changes() {
        let mut sel = SelectionController::new();
        sel.toggle(n("sel_a"));
        sel.toggle(n("sel_b"));
        sel.toggle(n("sel_a"));
        assert_eq!(sel.selected(), &[n("sel_b")]);
        assert!(!sel.set(vec![n("sel_b")]));
        assert!(sel.set(vec![n("sel_a"), n("sel_a"), n("sel_c")]));
        assert_eq!(sel.len(), 2);
        assert!(sel.remove(n("sel_a")));
        assert!(!sel.remove(n("sel_a")));
        assert!(sel.clear());
        assert!(!sel.clear());
    }
}
