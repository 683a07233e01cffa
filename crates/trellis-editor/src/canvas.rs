//! The canvas engine.
//!
//! `Canvas` owns the viewport transform, the node registry, the routed
//! connections, the drag and selection controllers and the event bus of a
//! single canvas instance. Hosts feed it pointer/wheel/key input in screen
//! pixels, call the imperative API, and listen for [`CanvasEvent`]s.
//!
//! All work is synchronous. The one deferral is connection routing during a
//! drag: moves only mark a redraw as pending and the host flushes it once per
//! animation frame with [`Canvas::frame`].

use crate::drag::{DragController, DragParams};
use crate::events::{CanvasEvent, EventBus, SubscriptionId};
use crate::input::{Button, Modifiers, PointerInput, WheelInput};
use crate::selection::SelectionController;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use std::collections::HashMap;
use trellis_core::hit;
use trellis_core::minimap::{self, MinimapModel};
use trellis_core::registry::{Measure, NodeRegistry};
use trellis_core::route::{Route, RouteStyle, route_connection};
use trellis_core::{
    CanvasConfig, CanvasState, Connection, ConnectionId, ConnectionOptions, Handle, NodeId,
    NodeRect, Point, Size, SnapGuide, ViewTransform, Viewport,
};

/// Padding used by the zoom-to-fit shortcut.
pub const FIT_PADDING: f64 = 50.0;

/// What the primary pointer is doing between press and release.
#[derive(Debug, Clone, Copy)]
enum Gesture {
    Idle,
    Pan { last: Point, button: Button },
    DragNode { origin: Point },
    PressConnection { id: ConnectionId, origin: Point },
    BoxSelect { origin: Point, modifiers: Modifiers },
}

pub struct Canvas {
    config: CanvasConfig,
    transform: ViewTransform,
    registry: NodeRegistry,
    routes: HashMap<ConnectionId, Route>,
    drag: DragController,
    selection: SelectionController,
    events: EventBus,
    gesture: Gesture,
    pan_mode: bool,
    redraw_pending: bool,
    redraw_count: u64,
    destroyed: bool,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("state", &self.transform.state())
            .field("registry", &self.registry)
            .field("selection", &self.selection.selected())
            .field("gesture", &self.gesture)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Canvas {
    /// Create a canvas with every node measured at the default size.
    pub fn new(config: CanvasConfig, viewport: Viewport) -> Self {
        let config = config.sanitized();
        let default_size = Size::new(config.default_node_width, config.default_node_height);
        Self {
            transform: ViewTransform::new(&config, viewport),
            registry: NodeRegistry::new(default_size),
            routes: HashMap::new(),
            drag: DragController::new(),
            selection: SelectionController::new(),
            events: EventBus::new(),
            gesture: Gesture::Idle,
            pan_mode: false,
            redraw_pending: false,
            redraw_count: 0,
            destroyed: false,
            config,
        }
    }

    /// Create a canvas that asks the host for each node's rendered size.
    pub fn with_measure(config: CanvasConfig, viewport: Viewport, measure: Box<dyn Measure>) -> Self {
        let mut canvas = Self::new(config, viewport);
        canvas.registry.set_measure(measure);
        canvas
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit_selection(&mut self) {
        let selected_ids = self.selection.selected().to_vec();
        self.events.emit(CanvasEvent::SelectionChange { selected_ids });
    }

    fn emit_zoom(&mut self) {
        let scale = self.transform.scale();
        self.events.emit(CanvasEvent::ZoomChange { scale });
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Place (or overwrite) a node. Returns true if the id was new.
    pub fn add_node(&mut self, id: &str, handle: Handle, x: f64, y: f64, data: serde_json::Value) -> bool {
        if self.destroyed {
            return false;
        }
        let added = self.registry.add_node(NodeId::intern(id), handle, x, y, data);
        self.redraw_connections();
        added
    }

    /// Remove a node, its connections and its selection membership.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(id) = NodeId::lookup(id) else {
            return false;
        };
        let Some(cascaded) = self.registry.remove_node(id) else {
            return false;
        };
        for conn in cascaded {
            self.routes.remove(&conn);
        }
        if self.drag.involves(id) {
            self.drag.cancel();
            self.gesture = Gesture::Idle;
        }
        if self.selection.remove(id) {
            self.emit_selection();
        }
        self.redraw_connections();
        true
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(id) = NodeId::lookup(id) else {
            return false;
        };
        if self.destroyed || !self.registry.move_node(id, x, y) {
            return false;
        }
        self.redraw_connections();
        true
    }

    pub fn has_node(&self, id: &str) -> bool {
        NodeId::lookup(id).is_some_and(|id| self.registry.has_node(id))
    }

    pub fn node_position(&self, id: &str) -> Option<Point> {
        self.registry.node_position(NodeId::lookup(id)?)
    }

    pub fn node_rect(&self, id: &str) -> Option<NodeRect> {
        self.registry.node_rect(NodeId::lookup(id)?)
    }

    pub fn all_node_rects(&self) -> Vec<(NodeId, NodeRect)> {
        self.registry.all_node_rects()
    }

    pub fn node_data(&self, id: &str) -> Option<serde_json::Value> {
        self.registry.node(NodeId::lookup(id)?).map(|n| n.data.clone())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.registry.node_ids().to_vec()
    }

    /// Topmost node under a screen point.
    pub fn node_at(&self, screen_x: f64, screen_y: f64) -> Option<NodeId> {
        hit::node_at(&self.registry, self.canvas_coords(screen_x, screen_y))
    }

    /// Swap the size provider, e.g. once the host's layout is ready.
    pub fn set_measure(&mut self, measure: Box<dyn Measure>) {
        self.registry.set_measure(measure);
        self.redraw_connections();
    }

    // ─── Regions ─────────────────────────────────────────────────────────

    pub fn add_region(&mut self, id: &str, rect: NodeRect) {
        if !self.destroyed {
            self.registry.add_region(id, rect);
        }
    }

    pub fn remove_region(&mut self, id: &str) -> bool {
        self.registry.remove_region(id)
    }

    pub fn clear_regions(&mut self) {
        self.registry.clear_regions();
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connect two existing nodes. Returns false if an endpoint is missing.
    pub fn add_connection(&mut self, id: &str, source: &str, target: &str, options: ConnectionOptions) -> bool {
        if self.destroyed {
            return false;
        }
        let (Some(source), Some(target)) = (NodeId::lookup(source), NodeId::lookup(target)) else {
            log::warn!("add_connection {id}: endpoint {source} or {target} does not exist");
            return false;
        };
        let id = ConnectionId::intern(id);
        if !self.registry.add_connection(id, source, target, options) {
            return false;
        }
        self.route_one(id);
        true
    }

    pub fn remove_connection(&mut self, id: &str) -> bool {
        let Some(id) = ConnectionId::lookup(id) else {
            return false;
        };
        self.routes.remove(&id);
        self.registry.remove_connection(id)
    }

    pub fn clear_connections(&mut self) {
        self.registry.clear_connections();
        self.routes.clear();
    }

    pub fn connection(&self, id: &str) -> Option<Connection> {
        self.registry.connection(ConnectionId::lookup(id)?).cloned()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.registry.connection_ids().to_vec()
    }

    pub fn connections_for_node(&self, id: &str) -> Vec<ConnectionId> {
        NodeId::lookup(id).map_or_else(Vec::new, |id| self.registry.connections_for_node(id))
    }

    pub fn route(&self, id: &str) -> Option<Route> {
        self.routes.get(&ConnectionId::lookup(id)?).cloned()
    }

    /// SVG path description of a routed connection.
    pub fn connection_path(&self, id: &str) -> Option<String> {
        self.routes.get(&ConnectionId::lookup(id)?).map(Route::svg)
    }

    /// Routed connections in insertion order, paired with their options.
    pub fn routes(&self) -> impl Iterator<Item = (&Connection, &Route)> {
        let routes = &self.routes;
        self.registry
            .connections()
            .filter_map(move |c| routes.get(&c.id).map(|r| (c, r)))
    }

    /// Topmost connection whose hit band contains a screen point.
    pub fn connection_at(&self, screen_x: f64, screen_y: f64) -> Option<ConnectionId> {
        let p = self.canvas_coords(screen_x, screen_y);
        let routes = self
            .registry
            .connection_ids()
            .iter()
            .filter_map(|id| self.routes.get(id).map(|r| (*id, r)));
        hit::connection_at(routes, p, self.config.connection_hit_width)
    }

    fn route_style(&self) -> RouteStyle {
        RouteStyle {
            corner_radius: self.config.connection_corner_radius,
            stub_length: self.config.port_stub_length,
        }
    }

    fn route_for(&self, conn: &Connection) -> Option<Route> {
        let source = self.registry.node_rect(conn.source)?;
        let target = self.registry.node_rect(conn.target)?;
        Some(route_connection(source, target, &conn.options, self.route_style()))
    }

    fn route_one(&mut self, id: ConnectionId) {
        let route = self.registry.connection(id).and_then(|c| self.route_for(c));
        match route {
            Some(route) => {
                self.routes.insert(id, route);
            }
            None => {
                self.routes.remove(&id);
            }
        }
    }

    /// Recompute every route from the current live node rectangles.
    /// Connections with a missing endpoint are skipped.
    pub fn redraw_connections(&mut self) {
        let routes: HashMap<ConnectionId, Route> = self
            .registry
            .connections()
            .filter_map(|c| self.route_for(c).map(|r| (c.id, r)))
            .collect();
        self.routes = routes;
        self.redraw_pending = false;
        self.redraw_count += 1;
        log::trace!("redraw_connections: {} routes", self.routes.len());
    }

    /// Flush a redraw requested during a drag. Call once per animation
    /// frame; returns true if routes were recomputed.
    pub fn frame(&mut self) -> bool {
        if !self.redraw_pending {
            return false;
        }
        self.redraw_connections();
        true
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// Total number of route recomputations so far.
    pub fn redraw_count(&self) -> u64 {
        self.redraw_count
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn scale(&self) -> f64 {
        self.transform.scale()
    }

    pub fn state(&self) -> CanvasState {
        self.transform.state()
    }

    pub fn viewport(&self) -> Viewport {
        self.transform.viewport()
    }

    pub fn set_scale(&mut self, scale: f64) {
        if !self.destroyed && self.transform.set_scale(scale) {
            self.emit_zoom();
        }
    }

    pub fn zoom_at_point(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        if !self.destroyed && self.transform.zoom_at_point(delta, screen_x, screen_y) {
            self.emit_zoom();
        }
    }

    /// Fit every node and region into view. No-op on an empty canvas.
    pub fn fit_to_view(&mut self, padding: f64) {
        if self.destroyed {
            return;
        }
        let Some(content) = self.registry.content_bounds() else {
            return;
        };
        log::debug!("fit_to_view {content:?} padding {padding}");
        if self.transform.fit_to_view(content, padding) {
            self.emit_zoom();
        }
    }

    /// Pan so a node's center sits at the viewport center.
    pub fn center_on_node(&mut self, id: &str) -> bool {
        match NodeId::lookup(id).and_then(|id| self.registry.node_rect(id)) {
            Some(rect) => {
                self.transform.center_on(rect.center());
                true
            }
            None => false,
        }
    }

    /// Screen → canvas conversion.
    pub fn canvas_coords(&self, screen_x: f64, screen_y: f64) -> Point {
        self.transform.screen_to_canvas(Point::new(screen_x, screen_y))
    }

    pub fn screen_coords(&self, canvas_x: f64, canvas_y: f64) -> Point {
        self.transform.canvas_to_screen(Point::new(canvas_x, canvas_y))
    }

    pub fn set_offset(&mut self, offset_x: f64, offset_y: f64) {
        if self.destroyed {
            return;
        }
        self.transform.set_offset(offset_x, offset_y);
    }

    /// The host container changed size.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.destroyed {
            return;
        }
        self.transform.resize(viewport);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.selection.selected().to_vec()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        NodeId::lookup(id).is_some_and(|id| self.selection.contains(id))
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection();
        }
    }

    /// Replace the selection with the given existing nodes.
    pub fn select_nodes(&mut self, ids: &[&str]) {
        let ids = ids
            .iter()
            .filter_map(|s| NodeId::lookup(s))
            .filter(|id| self.registry.has_node(*id))
            .collect();
        if self.selection.set(ids) {
            self.emit_selection();
        }
    }

    /// Rubber band in canvas units while one is open.
    pub fn selection_box(&self) -> Option<NodeRect> {
        self.selection.box_rect()
    }

    /// Nodes the open rubber band would select on release.
    pub fn pending_selection(&self) -> Vec<NodeId> {
        self.selection.pending().to_vec()
    }

    /// Alignment guides for the current drag frame.
    pub fn snap_guides(&self) -> &[SnapGuide] {
        self.drag.guides()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    // ─── Minimap ─────────────────────────────────────────────────────────

    fn minimap_size(&self) -> Size {
        Size::new(self.config.minimap_width, self.config.minimap_height)
    }

    /// Current minimap frame, or `None` when the minimap is disabled.
    pub fn minimap(&self) -> Option<MinimapModel> {
        if !self.config.show_minimap {
            return None;
        }
        let endpoints: Vec<(NodeId, NodeId)> = self
            .registry
            .connections()
            .map(|c| (c.source, c.target))
            .collect();
        Some(minimap::build_minimap(
            self.minimap_size(),
            &self.transform,
            &self.registry.all_node_rects(),
            &endpoints,
        ))
    }

    /// Recenter the main view on the canvas point under a minimap click.
    pub fn minimap_click(&mut self, minimap_x: f64, minimap_y: f64) -> bool {
        if self.destroyed || !self.config.show_minimap {
            return false;
        }
        let size = self.minimap_size();
        minimap::navigate(&mut self.transform, size, Point::new(minimap_x, minimap_y));
        true
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    fn drag_params(&self) -> DragParams {
        DragParams {
            scale: self.transform.scale(),
            snap_threshold: self.config.snap_threshold,
            click_tolerance: self.config.click_tolerance,
        }
    }

    fn is_click(&self, origin: Point, release: Point) -> bool {
        (release - origin).hypot() <= self.config.click_tolerance
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        if self.destroyed {
            return;
        }
        let screen = input.position();
        let canvas = self.transform.screen_to_canvas(screen);

        let pan = input.button == Button::Middle || (input.button == Button::Primary && self.pan_mode);
        if pan {
            self.transform.set_panning(true);
            self.gesture = Gesture::Pan {
                last: screen,
                button: input.button,
            };
            return;
        }
        if input.button != Button::Primary {
            return;
        }

        if let Some(node) = hit::node_at(&self.registry, canvas) {
            if input.modifiers.multi_select() {
                self.selection.toggle(node);
                self.emit_selection();
                self.gesture = Gesture::Idle;
                return;
            }
            if let Some(start) = self.drag.begin(&self.registry, node, screen, self.selection.selected()) {
                self.gesture = Gesture::DragNode { origin: screen };
                self.events.emit(CanvasEvent::NodeDragStart {
                    node_id: node,
                    x: start.x,
                    y: start.y,
                });
            }
            return;
        }

        if let Some(id) = self.connection_at(screen.x, screen.y) {
            self.gesture = Gesture::PressConnection { id, origin: screen };
            return;
        }

        if input.modifiers.alt && self.selection.clear() {
            self.emit_selection();
        }
        self.selection.begin_box(canvas);
        self.gesture = Gesture::BoxSelect {
            origin: screen,
            modifiers: input.modifiers,
        };
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        if self.destroyed {
            return;
        }
        let screen = input.position();
        match self.gesture {
            Gesture::Pan { last, button } => {
                self.transform.pan_by(screen.x - last.x, screen.y - last.y);
                self.gesture = Gesture::Pan { last: screen, button };
            }
            Gesture::DragNode { .. } => {
                let params = self.drag_params();
                if let Some(step) = self.drag.update(&mut self.registry, screen, params) {
                    self.redraw_pending = true;
                    self.events.emit(CanvasEvent::NodeDragMove {
                        node_id: step.node,
                        x: step.x,
                        y: step.y,
                        dx: step.dx,
                        dy: step.dy,
                    });
                }
            }
            Gesture::BoxSelect { .. } => {
                let canvas = self.transform.screen_to_canvas(screen);
                self.selection.update_box(&self.registry, canvas);
            }
            Gesture::PressConnection { .. } | Gesture::Idle => {}
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        if self.destroyed {
            return;
        }
        // only the button that opened the gesture can close it
        let owner = match self.gesture {
            Gesture::Idle => return,
            Gesture::Pan { button, .. } => button,
            _ => Button::Primary,
        };
        if input.button != owner {
            return;
        }
        let screen = input.position();
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Pan { .. } => self.transform.set_panning(false),
            Gesture::DragNode { .. } => {
                let Some(release) = self.drag.end(&self.registry) else {
                    return;
                };
                if release.moved {
                    self.redraw_connections();
                }
                self.events.emit(CanvasEvent::NodeDragEnd {
                    node_id: release.node,
                    x: release.x,
                    y: release.y,
                });
                if !release.moved {
                    self.events.emit(CanvasEvent::NodeClick { node_id: release.node });
                }
            }
            Gesture::PressConnection { id, origin } => {
                if self.is_click(origin, screen) && self.registry.has_connection(id) {
                    self.events.emit(CanvasEvent::ConnectionClick { connection_id: id });
                }
            }
            Gesture::BoxSelect { origin, modifiers } => {
                if self.is_click(origin, screen) {
                    self.selection.cancel_box();
                    if !modifiers.multi_select() && self.selection.clear() {
                        self.emit_selection();
                    }
                    let canvas = self.transform.screen_to_canvas(screen);
                    self.events.emit(CanvasEvent::CanvasClick {
                        x: canvas.x,
                        y: canvas.y,
                    });
                } else {
                    let canvas = self.transform.screen_to_canvas(screen);
                    self.selection.update_box(&self.registry, canvas);
                    if self.selection.commit_box() {
                        self.emit_selection();
                    }
                }
            }
            Gesture::Idle => {}
        }
    }

    pub fn double_click(&mut self, input: PointerInput) {
        if self.destroyed {
            return;
        }
        if let Some(node_id) = self.node_at(input.x, input.y) {
            self.events.emit(CanvasEvent::NodeDblclick { node_id });
        }
    }

    pub fn context_menu(&mut self, input: PointerInput) {
        if self.destroyed {
            return;
        }
        if let Some(node_id) = self.node_at(input.x, input.y) {
            self.events.emit(CanvasEvent::NodeContextmenu { node_id });
        }
    }

    /// Ctrl/⌘ + wheel zooms at the pointer; a plain wheel pans.
    pub fn wheel(&mut self, input: WheelInput) {
        if self.destroyed {
            return;
        }
        if input.modifiers.command() {
            let step = self.config.wheel_zoom_step;
            let delta = if input.dy < 0.0 {
                step
            } else if input.dy > 0.0 {
                -step
            } else {
                return;
            };
            self.zoom_at_point(delta, input.x, input.y);
        } else {
            self.transform.pan_by(-input.dx, -input.dy);
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Dispatch a key press. Returns true if it was bound.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if self.destroyed {
            return false;
        }
        match ShortcutMap::resolve(key, modifiers) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if self.destroyed {
            return false;
        }
        match ShortcutMap::resolve_release(key) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, action: ShortcutAction) {
        let viewport = self.transform.viewport();
        let (cx, cy) = (viewport.width / 2.0, viewport.height / 2.0);
        match action {
            ShortcutAction::ZoomIn => self.zoom_at_point(self.config.wheel_zoom_step, cx, cy),
            ShortcutAction::ZoomOut => self.zoom_at_point(-self.config.wheel_zoom_step, cx, cy),
            ShortcutAction::ZoomToFit => self.fit_to_view(FIT_PADDING),
            ShortcutAction::SelectAll => {
                let all = self.registry.node_ids().to_vec();
                if self.selection.set(all) {
                    self.emit_selection();
                }
            }
            ShortcutAction::Deselect => {
                if self.selection.is_boxing() {
                    self.selection.cancel_box();
                    self.gesture = Gesture::Idle;
                }
                self.clear_selection();
            }
            ShortcutAction::PanStart => self.pan_mode = true,
            ShortcutAction::PanEnd => self.pan_mode = false,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Detach every listener and forget all nodes, connections and
    /// sessions. The canvas ignores all input afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.drag.cancel();
        self.selection.cancel_box();
        self.selection.clear();
        self.events.clear();
        self.routes.clear();
        self.registry.clear();
        self.gesture = Gesture::Idle;
        self.redraw_pending = false;
        self.destroyed = true;
        log::debug!("canvas destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
