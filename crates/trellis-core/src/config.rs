//! Engine configuration.
//!
//! Every field has a typed default so hosts only override what they need.
//! JSON keys are camelCase to match what web hosts already pass around.

use serde::{Deserialize, Serialize};

/// Construction-time settings for a canvas instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Content extent in canvas units.
    pub grid_width: f64,
    pub grid_height: f64,

    pub min_scale: f64,
    pub max_scale: f64,
    pub initial_scale: f64,

    /// Snap distance in canvas units, independent of zoom.
    pub snap_threshold: f64,

    pub show_minimap: bool,
    pub minimap_width: f64,
    pub minimap_height: f64,

    /// Upper bound for the rounded-corner radius at route bends.
    pub connection_corner_radius: f64,
    /// Width of the invisible hit region around a connection.
    pub connection_hit_width: f64,
    /// Length of the straight stub leaving an explicit port.
    pub port_stub_length: f64,

    /// Size used when the host cannot measure a node's visual body.
    pub default_node_width: f64,
    pub default_node_height: f64,

    /// Scale change per wheel notch when zooming with ctrl/meta held.
    pub wheel_zoom_step: f64,
    /// Screen-pixel travel under which a press/release pair is a click.
    pub click_tolerance: f64,
    /// `fit_to_view` never zooms in past this scale.
    pub fit_max_scale: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_width: 5000.0,
            grid_height: 5000.0,
            min_scale: 0.25,
            max_scale: 2.0,
            initial_scale: 1.0,
            snap_threshold: 8.0,
            show_minimap: true,
            minimap_width: 200.0,
            minimap_height: 150.0,
            connection_corner_radius: 8.0,
            connection_hit_width: 12.0,
            port_stub_length: 20.0,
            default_node_width: 220.0,
            default_node_height: 120.0,
            wheel_zoom_step: 0.1,
            click_tolerance: 3.0,
            fit_max_scale: 1.2,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str::<CanvasConfig>(json)
            .map(CanvasConfig::sanitized)
            .map_err(|e| format!("invalid canvas config: {e}"))
    }

    /// Repair out-of-range values instead of rejecting them.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = CanvasConfig::default();

        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            self.min_scale = defaults.min_scale;
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            self.max_scale = defaults.max_scale;
        }
        if self.min_scale > self.max_scale {
            std::mem::swap(&mut self.min_scale, &mut self.max_scale);
        }
        if !self.initial_scale.is_finite() {
            self.initial_scale = defaults.initial_scale;
        }
        self.initial_scale = self.initial_scale.clamp(self.min_scale, self.max_scale);

        self.grid_width = non_negative(self.grid_width);
        self.grid_height = non_negative(self.grid_height);
        self.snap_threshold = non_negative(self.snap_threshold);
        self.minimap_width = non_negative(self.minimap_width);
        self.minimap_height = non_negative(self.minimap_height);
        self.connection_corner_radius = non_negative(self.connection_corner_radius);
        self.connection_hit_width = non_negative(self.connection_hit_width);
        self.port_stub_length = non_negative(self.port_stub_length);
        self.default_node_width = non_negative(self.default_node_width);
        self.default_node_height = non_negative(self.default_node_height);
        self.wheel_zoom_step = non_negative(self.wheel_zoom_step);
        self.click_tolerance = non_negative(self.click_tolerance);
        if !(self.fit_max_scale.is_finite() && self.fit_max_scale > 0.0) {
            self.fit_max_scale = defaults.fit_max_scale;
        }
        self
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}
