//! Node registry: placed nodes, the connections between them, and group
//! regions.
//!
//! Nodes and connections are stored in a `StableDiGraph` (nodes = placed
//! nodes, edges = connections), so removing a node structurally removes
//! every connection that references it. Lookups go through id indexes;
//! an insertion-ordered z-order list drives hit testing and makes every
//! iteration deterministic.

use crate::id::{ConnectionId, Handle, NodeId};
use crate::model::{CanvasNode, Connection, ConnectionOptions, NodeRect, Region};
use kurbo::{Point, Size};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

/// Host-side measurement of a node's rendered body.
///
/// Returning `None` means "unknown" and the registry falls back to the
/// configured default node size.
pub trait Measure {
    fn measure(&self, handle: Handle) -> Option<Size>;
}

/// Measurer for headless use: every node has the default size.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSize;

impl Measure for DefaultSize {
    fn measure(&self, _handle: Handle) -> Option<Size> {
        None
    }
}

impl<F> Measure for F
where
    F: Fn(Handle) -> Option<Size>,
{
    fn measure(&self, handle: Handle) -> Option<Size> {
        self(handle)
    }
}

pub struct NodeRegistry {
    graph: StableDiGraph<CanvasNode, Connection>,
    node_index: HashMap<NodeId, NodeIndex>,
    conn_index: HashMap<ConnectionId, EdgeIndex>,
    /// Back-to-front paint order (last = topmost).
    z_order: Vec<NodeId>,
    /// Connection insertion order.
    conn_order: Vec<ConnectionId>,
    regions: BTreeMap<String, Region>,
    measure: Box<dyn Measure>,
    default_size: Size,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.z_order)
            .field("connections", &self.conn_order)
            .field("regions", &self.regions.len())
            .finish()
    }
}

impl NodeRegistry {
    pub fn new(default_size: Size) -> Self {
        Self::with_measure(default_size, Box::new(DefaultSize))
    }

    pub fn with_measure(default_size: Size, measure: Box<dyn Measure>) -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            conn_index: HashMap::new(),
            z_order: Vec::new(),
            conn_order: Vec::new(),
            regions: BTreeMap::new(),
            measure,
            default_size,
        }
    }

    pub fn set_measure(&mut self, measure: Box<dyn Measure>) {
        self.measure = measure;
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Place a node. Re-adding an existing id overwrites its handle,
    /// position and payload in place; its connections, selection and
    /// z-order survive. Returns true if the id was new.
    pub fn add_node(
        &mut self,
        id: NodeId,
        handle: Handle,
        x: f64,
        y: f64,
        data: serde_json::Value,
    ) -> bool {
        if let Some(&idx) = self.node_index.get(&id) {
            log::debug!("add_node: overwriting existing node {id}");
            let node = &mut self.graph[idx];
            node.handle = handle;
            node.x = x;
            node.y = y;
            node.data = data;
            return false;
        }

        let idx = self.graph.add_node(CanvasNode {
            id,
            handle,
            x,
            y,
            data,
        });
        self.node_index.insert(id, idx);
        self.z_order.push(id);
        log::debug!("add_node {id} at ({x}, {y})");
        true
    }

    /// Remove a node and every connection referencing it.
    /// Returns the ids of the cascaded connections, or `None` if unknown.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Vec<ConnectionId>> {
        let idx = self.node_index.remove(&id)?;

        let mut cascaded: Vec<ConnectionId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        cascaded.sort_by_key(|c| self.conn_order.iter().position(|o| o == c));
        cascaded.dedup();

        for conn in &cascaded {
            self.conn_index.remove(conn);
        }
        self.conn_order.retain(|c| !cascaded.contains(c));
        self.z_order.retain(|n| *n != id);
        self.graph.remove_node(idx);

        log::debug!("remove_node {id} (cascaded {} connections)", cascaded.len());
        Some(cascaded)
    }

    /// Returns false for an unknown id.
    pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        match self.node_index.get(&id) {
            Some(&idx) => {
                let node = &mut self.graph[idx];
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&CanvasNode> {
        self.node_index.get(&id).map(|&idx| &self.graph[idx])
    }

    pub fn node_position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(|n| Point::new(n.x, n.y))
    }

    /// Bounding rectangle using the live measured size.
    pub fn node_rect(&self, id: NodeId) -> Option<NodeRect> {
        let node = self.node(id)?;
        let size = self
            .measure
            .measure(node.handle)
            .unwrap_or(self.default_size);
        Some(NodeRect::new(node.x, node.y, size.width, size.height))
    }

    /// All node rectangles, back to front.
    pub fn all_node_rects(&self) -> Vec<(NodeId, NodeRect)> {
        self.z_order
            .iter()
            .filter_map(|&id| self.node_rect(id).map(|r| (id, r)))
            .collect()
    }

    /// Node ids, back to front.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.z_order
    }

    pub fn node_count(&self) -> usize {
        self.z_order.len()
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connect two existing nodes. Re-using an id replaces the previous
    /// connection. Returns false if either endpoint is missing or the
    /// connection would loop back onto its own node.
    pub fn add_connection(
        &mut self,
        id: ConnectionId,
        source: NodeId,
        target: NodeId,
        options: ConnectionOptions,
    ) -> bool {
        let (Some(&from), Some(&to)) = (self.node_index.get(&source), self.node_index.get(&target))
        else {
            log::warn!("add_connection {id}: endpoint {source} or {target} does not exist");
            return false;
        };
        if from == to {
            log::warn!("add_connection {id}: self-connection on {source} ignored");
            return false;
        }

        if self.remove_connection(id) {
            log::debug!("add_connection: replacing existing connection {id}");
        }
        let edge = self.graph.add_edge(
            from,
            to,
            Connection {
                id,
                source,
                target,
                options,
            },
        );
        self.conn_index.insert(id, edge);
        self.conn_order.push(id);
        log::debug!("add_connection {id}: {source} → {target}");
        true
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        let Some(edge) = self.conn_index.remove(&id) else {
            return false;
        };
        self.graph.remove_edge(edge);
        self.conn_order.retain(|c| *c != id);
        true
    }

    pub fn clear_connections(&mut self) {
        self.graph.clear_edges();
        self.conn_index.clear();
        self.conn_order.clear();
    }

    pub fn has_connection(&self, id: ConnectionId) -> bool {
        self.conn_index.contains_key(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.conn_index.get(&id).and_then(|&e| self.graph.edge_weight(e))
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.conn_order.iter().filter_map(|&id| self.connection(id))
    }

    pub fn connection_ids(&self) -> &[ConnectionId] {
        &self.conn_order
    }

    /// Connections touching `node`, in insertion order.
    pub fn connections_for_node(&self, node: NodeId) -> Vec<ConnectionId> {
        self.connections()
            .filter(|c| c.source == node || c.target == node)
            .map(|c| c.id)
            .collect()
    }

    // ─── Regions ─────────────────────────────────────────────────────────

    pub fn add_region(&mut self, id: &str, rect: NodeRect) {
        self.regions.insert(id.to_string(), Region { rect });
    }

    pub fn remove_region(&mut self, id: &str) -> bool {
        self.regions.remove(id).is_some()
    }

    pub fn clear_regions(&mut self) {
        self.regions.clear();
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Union of every node rectangle and region, or `None` when empty.
    pub fn content_bounds(&self) -> Option<NodeRect> {
        self.all_node_rects()
            .into_iter()
            .map(|(_, r)| r)
            .chain(self.regions.values().map(|r| r.rect))
            .map(NodeRect::to_kurbo)
            .reduce(|a, b| a.union(b))
            .map(NodeRect::from_kurbo)
    }

    /// Drop everything. Handles are host-owned and simply forgotten.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
        self.conn_index.clear();
        self.z_order.clear();
        self.conn_order.clear();
        self.regions.clear();
    }
}
