//! Canvas data model.
//!
//! Nodes are positioned in canvas (unscaled) coordinates, top-left anchored.
//! Their size is never stored: it is measured live from the host's visual
//! body, so a node whose content grows or shrinks never leaves stale
//! geometry behind. Connections join two nodes and carry only drawing
//! options; their geometry is recomputed from node rectangles on demand.

use crate::id::{ConnectionId, Handle, NodeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let channel = |hi: u8, lo: u8| -> Option<f32> {
            Some((hex_val(hi)? << 4 | hex_val(lo)?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(
                channel(bytes[0], bytes[1])?,
                channel(bytes[2], bytes[3])?,
                channel(bytes[4], bytes[5])?,
                1.0,
            )),
            8 => Some(Self::rgba(
                channel(bytes[0], bytes[1])?,
                channel(bytes[2], bytes[3])?,
                channel(bytes[4], bytes[5])?,
                channel(bytes[6], bytes[7])?,
            )),
            _ => None,
        }
    }
}

/// Default connection stroke (slate grey).
pub const DEFAULT_CONNECTION_COLOR: &str = "#6B7080";

// ─── Rectangles ──────────────────────────────────────────────────────────

/// A node's bounding box in canvas coordinates.
///
/// Always handed out by value: callers own the snapshot and mutating it
/// never affects the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True unless `other` lies fully outside on one of the four sides.
    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &NodeRect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }

    /// Midpoint of the given side.
    pub fn port_point(&self, port: Port) -> Point {
        let c = self.center();
        match port {
            Port::Top => Point::new(c.x, self.y),
            Port::Bottom => Point::new(c.x, self.bottom()),
            Port::Left => Point::new(self.x, c.y),
            Port::Right => Point::new(self.right(), c.y),
        }
    }

    pub fn to_kurbo(self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    pub fn from_kurbo(r: Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.width(), r.height())
    }

    /// Normalized rectangle spanning two corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_kurbo(Rect::from_points(a, b))
    }
}

// ─── Ports & connection options ──────────────────────────────────────────

/// Named attachment side on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    Top,
    Bottom,
    Left,
    Right,
}

impl Port {
    /// Outward unit direction of the side.
    pub fn direction(self) -> (f64, f64) {
        match self {
            Port::Top => (0.0, -1.0),
            Port::Bottom => (0.0, 1.0),
            Port::Left => (-1.0, 0.0),
            Port::Right => (1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Port::Left | Port::Right)
    }
}

/// Drawing options attached to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Hex stroke color.
    pub color: String,
    /// Marching-dash animation along the path.
    pub animated: bool,
    pub dashed: bool,
    /// Draw a source → target arrow at the target end.
    pub arrowhead: bool,
    /// Explicit exit side on the source node (port mode when both set).
    pub source_port: Option<Port>,
    /// Explicit entry side on the target node.
    pub target_port: Option<Port>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            color: DEFAULT_CONNECTION_COLOR.to_string(),
            animated: false,
            dashed: false,
            arrowhead: true,
            source_port: None,
            target_port: None,
        }
    }
}

impl ConnectionOptions {
    /// Resolve the stroke color, falling back to the default on bad input.
    pub fn stroke_color(&self) -> Color {
        Color::from_hex(&self.color)
            .or_else(|| Color::from_hex(DEFAULT_CONNECTION_COLOR))
            .unwrap_or(Color::rgba(0.0, 0.0, 0.0, 1.0))
    }
}

// ─── Records ─────────────────────────────────────────────────────────────

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNode {
    pub id: NodeId,
    pub handle: Handle,
    pub x: f64,
    pub y: f64,
    /// Host-defined payload, opaque to the engine.
    pub data: serde_json::Value,
}

/// A connection between two placed nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
    pub options: ConnectionOptions,
}

/// A rectangular group area (org-chart departments, swimlanes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub rect: NodeRect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_parsing() {
        let c = Color::from_hex("#6B7080").unwrap();
        assert!((c.r - 107.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
        assert_eq!(Color::from_hex("fff"), Some(Color::rgba(1.0, 1.0, 1.0, 1.0)));
        assert!(Color::from_hex("#12").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn bad_option_color_falls_back() {
        let options = ConnectionOptions {
            color: "not-a-color".into(),
            ..ConnectionOptions::default()
        };
        assert_eq!(
            options.stroke_color(),
            Color::from_hex(DEFAULT_CONNECTION_COLOR).unwrap()
        );
    }

    #[test]
    fn intersection_counts_touching_edges() {
        let a = NodeRect::new(0.0, 0.0, 100.0, 100.0);
        let touching = NodeRect::new(100.0, 0.0, 50.0, 50.0);
        let apart = NodeRect::new(100.5, 0.0, 50.0, 50.0);
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn port_points_are_side_midpoints() {
        let r = NodeRect::new(0.0, 0.0, 220.0, 120.0);
        assert_eq!(r.port_point(Port::Right), Point::new(220.0, 60.0));
        assert_eq!(r.port_point(Port::Top), Point::new(110.0, 0.0));
        assert_eq!(r.port_point(Port::Bottom), Point::new(110.0, 120.0));
        assert_eq!(r.port_point(Port::Left), Point::new(0.0, 60.0));
    }

    #[test]
    fn corners_normalize() {
        let r = NodeRect::from_corners(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        assert_eq!(r, NodeRect::new(10.0, 20.0, 40.0, 60.0));
    }
}
