//! Gallery Previz host
//!
//! Opens a window onto a gallery document and forwards keyboard and mouse input
//! to the engine. Edits are written back to the document as they are made.

mod app;

fn main() {
    app::run();
}
