//! Orthogonal connection routing.
//!
//! Every route is an axis-aligned polyline of 4 to 6 points:
//!
//! - **Auto** (no ports): the dominant axis between the two rectangle
//!   centers picks the facing sides; one perpendicular midpoint segment
//!   turns the path into an L or Z shape.
//! - **Ports**: a short stub leaves each named side first, then the stubs
//!   are joined with two bends (parallel sides) or one bend (perpendicular
//!   sides).
//!
//! Interior bends are rounded with quadratic curves. The radius at each bend
//! is capped at half of both adjacent segments so curves never overlap.

use crate::model::{ConnectionOptions, NodeRect, Port};
use kurbo::{BezPath, ParamCurveNearest, Point, Vec2};
use smallvec::{SmallVec, smallvec};

const EPSILON: f64 = 1e-6;
const ARROW_SIZE: f64 = 8.0;

pub type RoutePoints = SmallVec<[Point; 6]>;

/// Routing parameters shared by every connection on a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStyle {
    pub corner_radius: f64,
    pub stub_length: f64,
}

/// A fully routed connection, ready to draw and hit-test.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub points: RoutePoints,
    pub path: BezPath,
    /// Tip, left and right corners of the arrowhead at the target end.
    pub arrow: Option<[Point; 3]>,
}

impl Route {
    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or(Point::ZERO)
    }

    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or(Point::ZERO)
    }

    /// SVG path description of the rounded path.
    pub fn svg(&self) -> String {
        self.path.to_svg()
    }

    /// Shortest distance from `p` to the drawn path.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.path
            .segments()
            .map(|seg| seg.nearest(p, 1e-3).distance_sq)
            .fold(f64::INFINITY, f64::min)
            .sqrt()
    }
}

/// Sides facing each other along the dominant axis between centers.
pub fn facing_ports(source: NodeRect, target: NodeRect) -> (Port, Port) {
    let d = target.center() - source.center();
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 {
            (Port::Right, Port::Left)
        } else {
            (Port::Left, Port::Right)
        }
    } else if d.y >= 0.0 {
        (Port::Bottom, Port::Top)
    } else {
        (Port::Top, Port::Bottom)
    }
}

/// Auto mode: exit and enter on facing sides with a single midpoint jog.
pub fn route_auto(source: NodeRect, target: NodeRect) -> RoutePoints {
    let (sp, tp) = facing_ports(source, target);
    let start = source.port_point(sp);
    let end = target.port_point(tp);

    if sp.is_horizontal() {
        let mid_x = (start.x + end.x) / 2.0;
        smallvec![start, Point::new(mid_x, start.y), Point::new(mid_x, end.y), end]
    } else {
        let mid_y = (start.y + end.y) / 2.0;
        smallvec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
    }
}

fn stub(p: Point, port: Port, length: f64) -> Point {
    let (dx, dy) = port.direction();
    Point::new(p.x + dx * length, p.y + dy * length)
}

/// Port mode: stub out of each side, then join the stubs.
pub fn route_ports(
    source: NodeRect,
    source_port: Port,
    target: NodeRect,
    target_port: Port,
    stub_length: f64,
) -> RoutePoints {
    let start = source.port_point(source_port);
    let end = target.port_point(target_port);
    let s = stub(start, source_port, stub_length);
    let t = stub(end, target_port, stub_length);

    match (source_port.is_horizontal(), target_port.is_horizontal()) {
        (true, true) => {
            let mid_x = (s.x + t.x) / 2.0;
            smallvec![start, s, Point::new(mid_x, s.y), Point::new(mid_x, t.y), t, end]
        }
        (false, false) => {
            let mid_y = (s.y + t.y) / 2.0;
            smallvec![start, s, Point::new(s.x, mid_y), Point::new(t.x, mid_y), t, end]
        }
        (true, false) => smallvec![start, s, Point::new(t.x, s.y), t, end],
        (false, true) => smallvec![start, s, Point::new(s.x, t.y), t, end],
    }
}

/// Build the drawable path, replacing each interior bend with a quadratic
/// corner. Zero-length neighbours and straight-through points fall back to
/// a plain line join.
pub fn rounded_path(points: &[Point], radius: f64) -> BezPath {
    let mut path = BezPath::new();
    let Some((&first, _)) = points.split_first() else {
        return path;
    };
    path.move_to(first);

    for w in points.windows(3) {
        let (prev, p, next) = (w[0], w[1], w[2]);
        let l1 = (p - prev).hypot();
        let l2 = (next - p).hypot();
        let r = radius.min(l1 / 2.0).min(l2 / 2.0);
        if r <= EPSILON {
            path.line_to(p);
            continue;
        }
        let d1 = (p - prev) / l1;
        let d2 = (next - p) / l2;
        if d1.cross(d2).abs() <= EPSILON {
            path.line_to(p);
            continue;
        }
        path.line_to(p - d1 * r);
        path.quad_to(p, p + d2 * r);
    }

    if let Some(&last) = points.last()
        && points.len() > 1
    {
        path.line_to(last);
    }
    path
}

/// Arrowhead triangle pointing along the last non-degenerate segment.
fn arrowhead(points: &[Point]) -> Option<[Point; 3]> {
    let tip = *points.last()?;
    let from = points.iter().rev().skip(1).find(|p| (tip - **p).hypot() > EPSILON)?;
    let dir: Vec2 = (tip - *from).normalize();
    let perp = Vec2::new(-dir.y, dir.x);
    let base = tip - dir * ARROW_SIZE;
    Some([
        tip,
        base + perp * (ARROW_SIZE / 2.0),
        base - perp * (ARROW_SIZE / 2.0),
    ])
}

/// Route one connection between two live node rectangles.
pub fn route_connection(
    source: NodeRect,
    target: NodeRect,
    options: &ConnectionOptions,
    style: RouteStyle,
) -> Route {
    let points = match (options.source_port, options.target_port) {
        (None, None) => route_auto(source, target),
        (sp, tp) => {
            let (auto_sp, auto_tp) = facing_ports(source, target);
            route_ports(
                source,
                sp.unwrap_or(auto_sp),
                target,
                tp.unwrap_or(auto_tp),
                style.stub_length,
            )
        }
    };
    let path = rounded_path(&points, style.corner_radius);
    let arrow = if options.arrowhead {
        arrowhead(&points)
    } else {
        None
    };
    Route {
        points,
        path,
        arrow,
    }
}
