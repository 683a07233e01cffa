//! Viewport transform: scale + offset between canvas and screen space.
//!
//! The affine map is `screen = canvas * scale + offset`. After every change
//! the offsets are re-clamped against the content extent: content larger
//! than the viewport cannot be panned past its edges, content smaller than
//! the viewport is centered.

use crate::config::CanvasConfig;
use crate::model::NodeRect;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// The host container (viewport) dimensions in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// Snapshot of the current zoom/pan state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub is_panning: bool,
}

/// Owns the zoom/pan state and every coordinate conversion.
#[derive(Debug, Clone)]
pub struct ViewTransform {
    state: CanvasState,
    viewport: Viewport,
    grid: Size,
    min_scale: f64,
    max_scale: f64,
    fit_max_scale: f64,
}

impl ViewTransform {
    pub fn new(config: &CanvasConfig, viewport: Viewport) -> Self {
        let mut t = Self {
            state: CanvasState {
                scale: config.initial_scale.clamp(config.min_scale, config.max_scale),
                offset_x: 0.0,
                offset_y: 0.0,
                is_panning: false,
            },
            viewport,
            grid: Size::new(config.grid_width, config.grid_height),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            fit_max_scale: config.fit_max_scale,
        };
        t.clamp_offsets();
        t
    }

    pub fn state(&self) -> CanvasState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.state.offset_x, self.state.offset_y)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn grid(&self) -> Size {
        self.grid
    }

    pub fn set_panning(&mut self, panning: bool) {
        self.state.is_panning = panning;
    }

    // ─── Coordinate conversion ───────────────────────────────────────────

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.state.offset_x) / self.state.scale,
            (screen.y - self.state.offset_y) / self.state.scale,
        )
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.state.scale + self.state.offset_x,
            canvas.y * self.state.scale + self.state.offset_y,
        )
    }

    /// The part of the canvas currently visible, in canvas coordinates.
    pub fn visible_rect(&self) -> NodeRect {
        let s = self.state.scale;
        NodeRect::new(
            -self.state.offset_x / s,
            -self.state.offset_y / s,
            self.viewport.width / s,
            self.viewport.height / s,
        )
    }

    // ─── Bounds clamping ─────────────────────────────────────────────────

    /// Valid offsets for the given scale. Pure: applying it to its own
    /// output returns the same values.
    pub fn clamped_offsets(&self, scale: f64, offset_x: f64, offset_y: f64) -> (f64, f64) {
        (
            clamp_axis(offset_x, self.grid.width * scale, self.viewport.width),
            clamp_axis(offset_y, self.grid.height * scale, self.viewport.height),
        )
    }

    pub fn clamp_offsets(&mut self) {
        let (x, y) = self.clamped_offsets(self.state.scale, self.state.offset_x, self.state.offset_y);
        self.state.offset_x = x;
        self.state.offset_y = y;
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    pub fn set_offset(&mut self, offset_x: f64, offset_y: f64) {
        self.state.offset_x = offset_x;
        self.state.offset_y = offset_y;
        self.clamp_offsets();
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.set_offset(self.state.offset_x + dx, self.state.offset_y + dy);
    }

    /// Zoom by `delta` keeping the canvas point under `(screen_x, screen_y)`
    /// fixed. Returns true if the scale changed.
    pub fn zoom_at_point(&mut self, delta: f64, screen_x: f64, screen_y: f64) -> bool {
        let old = self.state.scale;
        let new_scale = (old + delta).clamp(self.min_scale, self.max_scale);
        if new_scale == old || !new_scale.is_finite() {
            return false;
        }
        let anchor = self.screen_to_canvas(Point::new(screen_x, screen_y));
        self.state.offset_x = screen_x - anchor.x * new_scale;
        self.state.offset_y = screen_y - anchor.y * new_scale;
        self.state.scale = new_scale;
        self.clamp_offsets();
        log::trace!("zoom {old:.3} → {new_scale:.3} at ({screen_x}, {screen_y})");
        true
    }

    /// Set an absolute scale, zooming about the viewport centre.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        let delta = scale - self.state.scale;
        self.zoom_at_point(delta, self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Fit `content` (plus `padding` on every side) into the viewport.
    /// Returns true if the scale changed.
    pub fn fit_to_view(&mut self, content: NodeRect, padding: f64) -> bool {
        let w = content.width + padding * 2.0;
        let h = content.height + padding * 2.0;
        let mut scale = self.fit_max_scale;
        if w > 0.0 {
            scale = scale.min(self.viewport.width / w);
        }
        if h > 0.0 {
            scale = scale.min(self.viewport.height / h);
        }
        let scale = scale.clamp(self.min_scale, self.max_scale);
        let changed = scale != self.state.scale;

        let c = content.center();
        self.state.scale = scale;
        self.state.offset_x = self.viewport.width / 2.0 - c.x * scale;
        self.state.offset_y = self.viewport.height / 2.0 - c.y * scale;
        self.clamp_offsets();
        changed
    }

    /// Pan so `canvas_point` sits at the viewport centre, keeping the scale.
    pub fn center_on(&mut self, canvas_point: Point) {
        let s = self.state.scale;
        self.set_offset(
            self.viewport.width / 2.0 - canvas_point.x * s,
            self.viewport.height / 2.0 - canvas_point.y * s,
        );
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.clamp_offsets();
    }
}

fn clamp_axis(offset: f64, content: f64, view: f64) -> f64 {
    if content >= view {
        offset.clamp(-(content - view), 0.0)
    } else {
        (view - content) / 2.0
    }
}
