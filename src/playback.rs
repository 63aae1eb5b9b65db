//! Playback coordination: units, playlists, scrubbing and the one-voice rule.
//!
//! - `gesture` turns pointer and touch input into scrub ratios.
//! - `bus` carries "playback started" between units.
//! - `unit` drives one media pipeline through its lifecycle.
//! - `transport` sequences a playlist on top of a unit.

mod bus;
mod error;
mod gesture;
mod pipeline;
mod transport;
mod unit;

pub use bus::{BusEvent, PlaybackBus, Subscription, UnitId};
pub use error::PlaybackError;
pub use gesture::{BarBounds, NoCapture, PointerCapture, ScrubGesture, ScrubSignal};
pub use pipeline::{MediaPipeline, PipelineEvent};
pub use transport::{Navigation, PlaylistTransport};
pub use unit::{LifecycleState, PlaybackUnit, Session, UnitSignal};

#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
mod tests;
