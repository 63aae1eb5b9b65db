//! Track listings: the data model, loaders and display helpers.

mod display;
mod listing;
mod model;
mod scan;

pub use listing::load_sources;
pub use model::{Listing, Page, Track};
