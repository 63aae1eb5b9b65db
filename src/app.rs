//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds one section per listing,
//! the keyboard focus and the pointer routing for scrub drags.

mod model;

pub use model::*;
