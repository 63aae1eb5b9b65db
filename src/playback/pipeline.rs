//! The media pipeline a playback unit drives.
//!
//! Commands are requests; their outcome comes back later as a
//! [`PipelineEvent`] from [`MediaPipeline::poll_event`]. The one piece of
//! state read synchronously is the paused flag, which reflects what the
//! pipeline is actually doing (or has been asked to do) right now.

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Source decoded far enough to know its length.
    MetadataReady { duration: f64 },
    /// Periodic playhead report, in seconds.
    PositionAdvanced(f64),
    /// A `play` request took effect.
    Started,
    /// Playback stopped without reaching the end.
    Stopped,
    /// The source played to its end.
    Ended,
    /// A `bind` or `play` request could not be honoured.
    Failed(String),
}

pub trait MediaPipeline {
    /// Replace the current source. Any playback in progress stops.
    fn bind(&mut self, source: &str);

    /// Request playback. An accepted request flips the paused flag at once;
    /// the outcome is reported as [`PipelineEvent::Started`] or
    /// [`PipelineEvent::Failed`].
    fn play(&mut self);

    fn pause(&mut self);

    /// Jump to `seconds` from the start of the source.
    fn seek(&mut self, seconds: f64);

    /// Live paused flag. `false` from the moment `play` is requested.
    fn is_paused(&self) -> bool;

    /// Next pending lifecycle event, if any.
    fn poll_event(&mut self) -> Option<PipelineEvent>;
}
