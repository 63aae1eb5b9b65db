//! Layered settings: environment over `config.toml` over defaults.
//!
//! `schema` holds the serde-deserialized structs, `load` knows where the
//! file lives and how the layers stack.

mod load;
mod schema;

pub use schema::*;
