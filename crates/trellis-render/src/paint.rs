//! Canvas overlays → Vello drawing commands.
//!
//! Paints everything the engine itself owns: routed connections, snap
//! guides, the rubber band and the minimap. Node bodies belong to the host
//! and are never drawn here.
//!
//! Canvas-space painters take the current `CanvasState` and draw through its
//! affine, so overlay strokes are divided by the scale to stay one screen
//! pixel wide at every zoom level.

use kurbo::{Affine, BezPath, Circle, Join, Line, Point, Rect, RoundedRect, Size, Stroke as KurboStroke};
use peniko::{Color, Fill};
use trellis_core::{
    CanvasState, Connection, ConnectionOptions, GuideAxis, MinimapModel, NodeRect, Route, SnapGuide,
};
use vello::Scene;

/// Connection stroke width in canvas units.
pub const CONNECTION_WIDTH: f64 = 2.0;
/// Dash, gap lengths for dashed and animated connections.
pub const DASH_PATTERN: [f64; 2] = [6.0, 4.0];
/// Canvas units per second that animated dashes travel.
pub const DASH_SPEED: f64 = 30.0;

const GUIDE_COLOR: &str = "#FF3B8B";
const SELECTION_FILL: trellis_core::Color = trellis_core::Color::rgba(0.23, 0.51, 0.96, 0.12);
const SELECTION_STROKE: trellis_core::Color = trellis_core::Color::rgba(0.23, 0.51, 0.96, 0.9);

// ─── Transforms ──────────────────────────────────────────────────────────────

/// Canvas → screen affine for the given zoom/pan state.
pub fn view_affine(state: &CanvasState) -> Affine {
    Affine::new([state.scale, 0.0, 0.0, state.scale, state.offset_x, state.offset_y])
}

/// A canvas-space width that renders `px` screen pixels wide.
fn hairline(state: &CanvasState, px: f64) -> f64 {
    if state.scale > 0.0 { px / state.scale } else { px }
}

pub fn to_peniko(c: trellis_core::Color) -> Color {
    Color::new([c.r, c.g, c.b, c.a])
}

// ─── Connections ─────────────────────────────────────────────────────────────

/// Dash phase for animated connections at `time_ms`, always in
/// `(-pattern_length, 0]` so the dashes march from source to target.
pub fn dash_offset(time_ms: f64) -> f64 {
    let period: f64 = DASH_PATTERN.iter().sum();
    let travelled = (time_ms * DASH_SPEED / 1000.0).rem_euclid(period);
    if travelled == 0.0 { 0.0 } else { -travelled }
}

/// Stroke style for one connection.
pub fn connection_stroke(options: &ConnectionOptions, time_ms: f64) -> KurboStroke {
    let stroke = KurboStroke::new(CONNECTION_WIDTH).with_join(Join::Round);
    if options.animated {
        stroke.with_dashes(dash_offset(time_ms), DASH_PATTERN)
    } else if options.dashed {
        stroke.with_dashes(0.0, DASH_PATTERN)
    } else {
        stroke
    }
}

/// Paint every routed connection, back to front.
///
/// `time_ms` is the host's animation clock; it only affects connections with
/// `animated` set.
pub fn paint_connections<'a>(
    scene: &mut Scene,
    routes: impl IntoIterator<Item = (&'a Connection, &'a Route)>,
    state: &CanvasState,
    time_ms: f64,
) {
    let transform = view_affine(state);
    for (connection, route) in routes {
        let color = to_peniko(connection.options.stroke_color());
        let stroke = connection_stroke(&connection.options, time_ms);
        scene.stroke(&stroke, transform, color, None, &route.path);

        if let Some([tip, left, right]) = route.arrow {
            let mut head = BezPath::new();
            head.move_to(tip);
            head.line_to(left);
            head.line_to(right);
            head.close_path();
            scene.fill(Fill::NonZero, transform, color, None, &head);
        }
    }
}

// ─── Drag & selection overlays ───────────────────────────────────────────────

/// Alignment guides, each spanning the two rectangles it aligns.
pub fn paint_guides(scene: &mut Scene, guides: &[SnapGuide], state: &CanvasState) {
    if guides.is_empty() {
        return;
    }
    let transform = view_affine(state);
    let stroke = KurboStroke::new(hairline(state, 1.0));
    let color = trellis_core::Color::from_hex(GUIDE_COLOR).map_or(Color::from_rgb8(255, 0, 128), to_peniko);

    for guide in guides {
        let line = match guide.axis {
            GuideAxis::Vertical => Line::new((guide.position, guide.start), (guide.position, guide.end)),
            GuideAxis::Horizontal => Line::new((guide.start, guide.position), (guide.end, guide.position)),
        };
        scene.stroke(&stroke, transform, color, None, &line);
    }
}

/// Translucent rubber band.
pub fn paint_selection_box(scene: &mut Scene, rect: NodeRect, state: &CanvasState) {
    let transform = view_affine(state);
    let shape = rect.to_kurbo();
    scene.fill(Fill::NonZero, transform, to_peniko(SELECTION_FILL), None, &shape);
    let stroke = KurboStroke::new(hairline(state, 1.0));
    scene.stroke(&stroke, transform, to_peniko(SELECTION_STROKE), None, &shape);
}

/// Outline the nodes a rubber band would select on release.
pub fn paint_highlights(scene: &mut Scene, rects: &[NodeRect], state: &CanvasState) {
    let transform = view_affine(state);
    let stroke = KurboStroke::new(hairline(state, 2.0));
    for rect in rects {
        let shape = RoundedRect::from_rect(rect.to_kurbo(), 4.0);
        scene.stroke(&stroke, transform, to_peniko(SELECTION_STROKE), None, &shape);
    }
}

// ─── Minimap ─────────────────────────────────────────────────────────────────

/// Top-left corner of a minimap docked in the bottom-right of the viewport.
pub fn minimap_origin(viewport: Size, minimap: Size, margin: f64) -> Point {
    Point::new(
        viewport.width - minimap.width - margin,
        viewport.height - minimap.height - margin,
    )
}

/// Paint a minimap frame in screen space with its top-left at `origin`.
pub fn paint_minimap(scene: &mut Scene, model: &MinimapModel, origin: Point) {
    let transform = Affine::translate(origin.to_vec2());

    let panel = RoundedRect::from_rect(Rect::from_origin_size(Point::ZERO, model.size), 6.0);
    scene.fill(Fill::NonZero, transform, Color::from_rgba8(248, 249, 251, 230), None, &panel);
    scene.stroke(&KurboStroke::new(1.0), transform, Color::from_rgba8(208, 212, 220, 255), None, &panel);

    let link = KurboStroke::new(1.0);
    let link_color = Color::from_rgba8(107, 112, 128, 90);
    for (a, b) in &model.lines {
        scene.stroke(&link, transform, link_color, None, &Line::new(*a, *b));
    }

    let dot_color = Color::from_rgba8(59, 130, 246, 255);
    for (_, center) in &model.dots {
        scene.fill(Fill::NonZero, transform, dot_color, None, &Circle::new(*center, 2.0));
    }

    let view = model.viewport.to_kurbo();
    scene.fill(Fill::NonZero, transform, Color::from_rgba8(59, 130, 246, 30), None, &view);
    scene.stroke(&KurboStroke::new(1.0), transform, Color::from_rgba8(59, 130, 246, 200), None, &view);
    log::trace!("minimap: {} dots, {} lines", model.dots.len(), model.lines.len());
}
