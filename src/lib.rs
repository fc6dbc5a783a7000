//! Gallery Previz - interactive 3D gallery room
//!
//! The engine keeps a small scene graph for a gallery room and lets an owner
//! rearrange the artworks hanging in it:
//! - walk the room with the keyboard, look around with the mouse
//! - click an artwork to select it, drag to move / rotate / push it back
//! - grab a corner handle to resize without distorting the image
//! - every edit is tracked as dirty and saved through an [`persist::ArtworkStore`]
//!
//! [`Gallery`] is the host-facing entry point; everything else is exposed for
//! hosts that want to compose the pieces differently.

pub mod assets;
pub mod config;
pub mod gallery;
pub mod input;
pub mod interact;
pub mod persist;
pub mod render;
pub mod scene;
pub mod ui;
pub mod worker;

pub use config::GalleryConfig;
pub use gallery::{EditMode, Gallery, GalleryEvent};
pub use scene::{Artwork, ArtworkId};
