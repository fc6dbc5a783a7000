//! Selecting artworks and dragging them around the room.

mod selection;
mod transform;

pub use selection::{SelectionChange, SelectionManager};
pub use transform::{aspect_locked_scale, DragMode, TransformManager};
