//! Audio output: the system stream and `rodio`-backed media pipelines.

mod error;
mod output;
mod pipeline;
mod sink;

pub use error::AudioError;
pub use output::AudioOutput;
pub use pipeline::RodioPipeline;
