pub mod config;
pub mod hit;
pub mod id;
pub mod minimap;
pub mod model;
pub mod registry;
pub mod route;
pub mod snap;
pub mod viewport;

pub use config::CanvasConfig;
pub use id::{ConnectionId, Handle, NodeId};
pub use minimap::MinimapModel;
pub use model::*;
pub use registry::{DefaultSize, Measure, NodeRegistry};
pub use route::{Route, RouteStyle};
pub use snap::{GuideAxis, SnapGuide};
pub use viewport::{CanvasState, ViewTransform, Viewport};

// Re-export kurbo geometry so hosts don't need a direct dependency
pub use kurbo::{Point, Size};
