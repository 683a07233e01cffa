//! Integration tests: event sequences seen by a host subscriber.
//!
//! Each test records every `CanvasEvent` a canvas emits while it is driven
//! with pointer, wheel and keyboard input.

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use trellis_core::{CanvasConfig, ConnectionId, ConnectionOptions, Handle, NodeId, Point};
use trellis_editor::{Button, Canvas, CanvasEvent, Modifiers, PointerInput, WheelInput};

const VIEWPORT: trellis_core::Viewport = trellis_core::Viewport {
    width: 1200.0,
    height: 800.0,
};

type Log = Rc<RefCell<Vec<CanvasEvent>>>;

fn canvas_with(nodes: &[(&str, f64, f64)]) -> Canvas {
    let mut c = Canvas::new(CanvasConfig::default(), VIEWPORT);
    for (id, x, y) in nodes {
        c.add_node(id, Handle(0), *x, *y, serde_json::Value::Null);
    }
    c
}

fn record(canvas: &mut Canvas) -> Log {
    let log: Log = Rc::default();
    let sink = log.clone();
    canvas.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    log
}

fn names(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(CanvasEvent::name).collect()
}

fn click(c: &mut Canvas, x: f64, y: f64) {
    c.pointer_down(PointerInput::at(x, y));
    c.pointer_up(PointerInput::at(x, y));
}

fn n(s: &str) -> NodeId {
    NodeId::intern(s)
}

// ─── Node gestures ──────────────────────────────────────────────────────

#[test]
fn press_and_release_on_node_is_a_click() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log = record(&mut c);

    c.pointer_down(PointerInput::at(10.0, 10.0));
    c.pointer_up(PointerInput::at(11.0, 12.0));

    assert_eq!(names(&log), vec!["node-drag-start", "node-drag-end", "node-click"]);
    assert_eq!(c.node_position("A"), Some(Point::new(0.0, 0.0)));
}

#[test]
fn drag_reports_total_displacement() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log = record(&mut c);

    c.pointer_down(PointerInput::at(10.0, 10.0));
    c.pointer_move(PointerInput::at(60.0, 10.0));
    c.pointer_move(PointerInput::at(110.0, 10.0));
    c.pointer_up(PointerInput::at(110.0, 10.0));

    assert_eq!(
        *log.borrow(),
        vec![
            CanvasEvent::NodeDragStart { node_id: n("A"), x: 0.0, y: 0.0 },
            CanvasEvent::NodeDragMove { node_id: n("A"), x: 50.0, y: 0.0, dx: 50.0, dy: 0.0 },
            CanvasEvent::NodeDragMove { node_id: n("A"), x: 100.0, y: 0.0, dx: 100.0, dy: 0.0 },
            CanvasEvent::NodeDragEnd { node_id: n("A"), x: 100.0, y: 0.0 },
        ]
    );
}

#[test]
fn drag_moves_coalesce_into_one_redraw_per_frame() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    c.add_connection("c1", "A", "B", ConnectionOptions::default());
    let before = c.redraw_count();

    c.pointer_down(PointerInput::at(10.0, 10.0));
    c.pointer_move(PointerInput::at(10.0, 20.0));
    c.pointer_move(PointerInput::at(10.0, 30.0));
    c.pointer_move(PointerInput::at(10.0, 40.0));

    assert!(c.redraw_pending());
    assert_eq!(c.redraw_count(), before);
    assert_eq!(c.route("c1").unwrap().start(), Point::new(220.0, 60.0));

    assert!(c.frame());
    assert!(!c.frame());
    assert_eq!(c.redraw_count(), before + 1);
    assert_eq!(c.route("c1").unwrap().start(), Point::new(220.0, 90.0));

    c.pointer_up(PointerInput::at(10.0, 40.0));
    assert!(!c.redraw_pending());
}

#[test]
fn modifier_click_toggles_selection_without_dragging() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    let log = record(&mut c);
    let shift = Modifiers::shift();

    c.pointer_down(PointerInput::at(10.0, 10.0).with_modifiers(shift));
    c.pointer_down(PointerInput::at(310.0, 10.0).with_modifiers(shift));
    c.pointer_down(PointerInput::at(10.0, 10.0).with_modifiers(shift));

    assert_eq!(
        *log.borrow(),
        vec![
            CanvasEvent::SelectionChange { selected_ids: vec![n("A")] },
            CanvasEvent::SelectionChange { selected_ids: vec![n("A"), n("B")] },
            CanvasEvent::SelectionChange { selected_ids: vec![n("B")] },
        ]
    );
    assert!(!c.is_dragging());
}

#[test]
fn double_click_and_context_menu_hit_nodes_only() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log = record(&mut c);

    c.double_click(PointerInput::at(50.0, 50.0));
    c.context_menu(PointerInput::at(50.0, 50.0).with_button(Button::Secondary));
    c.double_click(PointerInput::at(900.0, 700.0));

    assert_eq!(names(&log), vec!["node-dblclick", "node-contextmenu"]);
}

#[test]
fn removing_a_selected_node_updates_the_selection() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    c.select_nodes(&["A", "B"]);
    let log = record(&mut c);

    c.remove_node("A");

    assert_eq!(
        *log.borrow(),
        vec![CanvasEvent::SelectionChange { selected_ids: vec![n("B")] }]
    );
}

// ─── Canvas & connections ───────────────────────────────────────────────

#[test]
fn empty_canvas_click_clears_selection_and_reports_canvas_coords() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    c.set_scale(2.0);
    c.select_nodes(&["A"]);
    let log = record(&mut c);

    click(&mut c, 800.0, 600.0);

    assert_eq!(
        *log.borrow(),
        vec![
            CanvasEvent::SelectionChange { selected_ids: vec![] },
            CanvasEvent::CanvasClick { x: 700.0, y: 500.0 },
        ]
    );
}

#[test]
fn shift_click_on_empty_canvas_keeps_selection() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    c.select_nodes(&["A"]);
    let log = record(&mut c);

    let at = PointerInput::at(800.0, 600.0).with_modifiers(Modifiers::shift());
    c.pointer_down(at);
    c.pointer_up(at);

    assert_eq!(names(&log), vec!["canvas-click"]);
    assert_eq!(c.selected_nodes(), vec![n("A")]);
}

#[test]
fn clicking_a_connection_reports_its_id() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    c.add_connection("c1", "A", "B", ConnectionOptions::default());
    let log = record(&mut c);

    click(&mut c, 260.0, 61.0);
    // pressed on the connection but released far away
    c.pointer_down(PointerInput::at(260.0, 61.0));
    c.pointer_up(PointerInput::at(260.0, 200.0));

    assert_eq!(
        *log.borrow(),
        vec![CanvasEvent::ConnectionClick { connection_id: ConnectionId::intern("c1") }]
    );
}

// ─── Wheel & keyboard ───────────────────────────────────────────────────

#[test]
fn command_wheel_zooms_and_plain_wheel_pans() {
    let mut c = canvas_with(&[]);
    let log = record(&mut c);

    c.wheel(WheelInput {
        x: 100.0,
        y: 100.0,
        dy: -1.0,
        modifiers: Modifiers { ctrl: true, ..Modifiers::NONE },
        ..Default::default()
    });
    assert!((c.scale() - 1.1).abs() < 1e-12);
    assert_eq!(names(&log), vec!["zoom-change"]);

    let before = c.state();
    c.wheel(WheelInput {
        dy: 50.0,
        ..Default::default()
    });
    assert!((c.state().offset_y - (before.offset_y - 50.0)).abs() < 1e-9);
    assert_eq!(c.scale(), before.scale);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn zoom_change_is_not_emitted_at_the_bounds() {
    let mut c = canvas_with(&[]);
    c.set_scale(2.0);
    let log = record(&mut c);
    c.zoom_at_point(0.5, 10.0, 10.0);
    c.set_scale(2.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn shortcuts_select_all_and_deselect() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    let log = record(&mut c);
    let cmd = Modifiers { meta: true, ..Modifiers::NONE };

    assert!(c.key_down("a", cmd));
    assert!(c.key_down("Escape", Modifiers::NONE));
    assert!(c.key_down("Escape", Modifiers::NONE));
    assert!(!c.key_down("q", Modifiers::NONE));

    assert_eq!(
        *log.borrow(),
        vec![
            CanvasEvent::SelectionChange { selected_ids: vec![n("A"), n("B")] },
            CanvasEvent::SelectionChange { selected_ids: vec![] },
        ]
    );
}

#[test]
fn escape_abandons_an_open_rubber_band() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    c.pointer_down(PointerInput::at(400.0, 400.0));
    c.pointer_move(PointerInput::at(5.0, 5.0));
    assert!(c.selection_box().is_some());

    c.key_down("Escape", Modifiers::NONE);
    c.pointer_up(PointerInput::at(5.0, 5.0));

    assert!(c.selection_box().is_none());
    assert!(c.selected_nodes().is_empty());
}

#[test]
fn space_held_turns_primary_drag_into_pan() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    c.set_offset(-200.0, -200.0);
    let log = record(&mut c);

    c.key_down(" ", Modifiers::NONE);
    c.pointer_down(PointerInput::at(100.0, 100.0));
    assert!(c.state().is_panning);
    c.pointer_move(PointerInput::at(50.0, 80.0));
    c.pointer_up(PointerInput::at(50.0, 80.0));
    c.key_up(" ");

    let state = c.state();
    assert_eq!((state.offset_x, state.offset_y), (-250.0, -220.0));
    assert!(!state.is_panning);
    assert!(log.borrow().is_empty());
}

#[test]
fn middle_button_pans_even_over_a_node() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log = record(&mut c);

    c.pointer_down(PointerInput::at(10.0, 10.0).with_button(Button::Middle));
    c.pointer_move(PointerInput::at(0.0, 0.0));
    assert!(c.state().is_panning);
    c.pointer_up(PointerInput::at(0.0, 0.0).with_button(Button::Middle));

    assert_eq!(c.node_position("A"), Some(Point::new(0.0, 0.0)));
    assert_eq!(c.state().offset_x, -10.0);
    assert!(!c.state().is_panning);
    assert!(log.borrow().is_empty());
}

#[test]
fn releasing_another_button_does_not_end_a_drag() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log = record(&mut c);

    c.pointer_down(PointerInput::at(10.0, 10.0));
    c.pointer_move(PointerInput::at(60.0, 10.0));
    c.pointer_up(PointerInput::at(60.0, 10.0).with_button(Button::Secondary));
    c.pointer_up(PointerInput::at(60.0, 10.0).with_button(Button::Middle));
    assert!(c.is_dragging());

    c.pointer_move(PointerInput::at(110.0, 10.0));
    c.pointer_up(PointerInput::at(110.0, 10.0));

    assert!(!c.is_dragging());
    assert_eq!(c.node_position("A"), Some(Point::new(100.0, 0.0)));
    assert_eq!(
        names(&log),
        vec!["node-drag-start", "node-drag-move", "node-drag-move", "node-drag-end"]
    );
}

#[test]
fn primary_release_does_not_end_a_middle_button_pan() {
    let mut c = canvas_with(&[]);
    c.set_offset(-100.0, -100.0);

    c.pointer_down(PointerInput::at(500.0, 500.0).with_button(Button::Middle));
    c.pointer_up(PointerInput::at(500.0, 500.0));
    c.pointer_move(PointerInput::at(480.0, 490.0));
    assert!(c.state().is_panning);
    assert_eq!((c.state().offset_x, c.state().offset_y), (-120.0, -110.0));

    c.pointer_up(PointerInput::at(480.0, 490.0).with_button(Button::Middle));
    assert!(!c.state().is_panning);
}

#[test]
fn zoom_to_fit_shortcut_emits_zoom_change() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    let log = record(&mut c);
    c.key_down("0", Modifiers { ctrl: true, ..Modifiers::NONE });
    assert_eq!(*log.borrow(), vec![CanvasEvent::ZoomChange { scale: 1.2 }]);
}

// ─── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn unsubscribed_listener_hears_nothing() {
    let mut c = canvas_with(&[("A", 0.0, 0.0)]);
    let log: Log = Rc::default();
    let sink = log.clone();
    let sub = c.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    assert!(c.unsubscribe(sub));

    click(&mut c, 10.0, 10.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn destroy_detaches_listeners_and_forgets_everything() {
    let mut c = canvas_with(&[("A", 0.0, 0.0), ("B", 300.0, 0.0)]);
    c.add_connection("c1", "A", "B", ConnectionOptions::default());
    let log = record(&mut c);

    c.destroy();
    assert!(c.is_destroyed());
    assert!(c.node_ids().is_empty());
    assert!(c.route("c1").is_none());

    assert!(!c.add_node("C", Handle(0), 0.0, 0.0, serde_json::Value::Null));
    click(&mut c, 10.0, 10.0);
    c.set_scale(1.5);
    assert!(log.borrow().is_empty());
    assert_eq!(c.scale(), 1.0);

    c.destroy();
}
