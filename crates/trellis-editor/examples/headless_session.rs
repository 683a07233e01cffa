//! Lays out a tiny org chart headlessly and prints the emitted events and
//! routed connection paths.
//!
//! Run with `RUST_LOG=trace` to see the engine's internal logging.

use trellis_core::{CanvasConfig, ConnectionOptions, Handle, Port};
use trellis_editor::{Canvas, PointerInput};

fn main() {
    env_logger::init();

    let config = CanvasConfig::from_json(r#"{ "snapThreshold": 12 }"#).unwrap_or_default();
    let mut canvas = Canvas::new(config, Default::default());
    canvas.subscribe(|event| println!("event  {}", event.to_json()));

    canvas.add_node("ceo", Handle(1), 290.0, 40.0, serde_json::json!({ "name": "Ada" }));
    canvas.add_node("cto", Handle(2), 40.0, 300.0, serde_json::json!({ "name": "Grace" }));
    canvas.add_node("cfo", Handle(3), 540.0, 300.0, serde_json::json!({ "name": "Edsger" }));

    let down = ConnectionOptions {
        source_port: Some(Port::Bottom),
        target_port: Some(Port::Top),
        ..Default::default()
    };
    canvas.add_connection("ceo-cto", "ceo", "cto", down.clone());
    canvas.add_connection("ceo-cfo", "ceo", "cfo", down);

    // Drag the CFO close to the CTO's row; it snaps into alignment.
    canvas.pointer_down(PointerInput::at(560.0, 320.0));
    canvas.pointer_move(PointerInput::at(580.0, 330.0));
    canvas.frame();
    canvas.pointer_up(PointerInput::at(580.0, 330.0));

    canvas.fit_to_view(50.0);

    for (connection, route) in canvas.routes() {
        println!("path   {} {}", connection.id, route.svg());
    }
    println!("state  {:?}", canvas.state());
}
