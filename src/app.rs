//! Application module: the presentation model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the list cursor and view
//! flags. Playback state itself belongs to the engine and is only read here.

mod model;

pub use model::*;
