pub mod paint;

pub use paint::{
    minimap_origin, paint_connections, paint_guides, paint_highlights, paint_minimap, paint_selection_box,
    view_affine,
};
