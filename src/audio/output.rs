use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder};

use crate::config::AudioSettings;

use super::error::AudioError;
use super::pipeline::RodioPipeline;

/// The system output device. Every pipeline mixes into it.
pub struct AudioOutput {
    stream: OutputStream,
}

impl AudioOutput {
    pub fn open_default() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        log::info!("audio: opened default output stream");
        Ok(Self { stream })
    }

    /// A fresh pipeline with its own sink on this output.
    pub fn pipeline(&self, settings: &AudioSettings) -> RodioPipeline {
        RodioPipeline::new(
            self.stream.mixer().clone(),
            Duration::from_millis(settings.position_interval_ms.max(1)),
        )
    }
}
