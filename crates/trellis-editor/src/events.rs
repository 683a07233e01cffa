//! Events emitted from the engine to its host.
//!
//! Delivery is synchronous and in subscription order. Events serialize to
//! JSON with a kebab-case `type` tag so a host bridge can forward them
//! unchanged.

use serde::Serialize;
use trellis_core::{ConnectionId, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CanvasEvent {
    NodeClick {
        node_id: NodeId,
    },
    NodeDblclick {
        node_id: NodeId,
    },
    NodeContextmenu {
        node_id: NodeId,
    },
    NodeDragStart {
        node_id: NodeId,
        x: f64,
        y: f64,
    },
    /// `dx`/`dy` are the total canvas-space displacement since drag start.
    NodeDragMove {
        node_id: NodeId,
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
    NodeDragEnd {
        node_id: NodeId,
        x: f64,
        y: f64,
    },
    /// Click on empty canvas, in canvas coordinates.
    CanvasClick {
        x: f64,
        y: f64,
    },
    ConnectionClick {
        connection_id: ConnectionId,
    },
    SelectionChange {
        selected_ids: Vec<NodeId>,
    },
    ZoomChange {
        scale: f64,
    },
}

impl CanvasEvent {
    /// The wire name of the event (`"node-click"`, …).
    pub fn name(&self) -> &'static str {
        match self {
            CanvasEvent::NodeClick { .. } => "node-click",
            CanvasEvent::NodeDblclick { .. } => "node-dblclick",
            CanvasEvent::NodeContextmenu { .. } => "node-contextmenu",
            CanvasEvent::NodeDragStart { .. } => "node-drag-start",
            CanvasEvent::NodeDragMove { .. } => "node-drag-move",
            CanvasEvent::NodeDragEnd { .. } => "node-drag-end",
            CanvasEvent::CanvasClick { .. } => "canvas-click",
            CanvasEvent::ConnectionClick { .. } => "connection-click",
            CanvasEvent::SelectionChange { .. } => "selection-change",
            CanvasEvent::ZoomChange { .. } => "zoom-change",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CanvasEvent)>;

/// Subscriber list owned by one canvas instance.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: CanvasEvent) {
        log::trace!("emit {}", event.name());
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
