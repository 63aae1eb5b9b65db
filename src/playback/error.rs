use thiserror::Error;

/// Recoverable playback failures. None of them leave a unit in an invalid state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The pipeline refused to start, or the bound source is unusable.
    #[error("playback rejected: {reason}")]
    PlaybackRejected { reason: String },
    /// Navigation outside the playlist; reported by `Navigation::Ignored` instead.
    #[error("no track at index {index} (playlist has {len})")]
    InvalidNavigation { index: usize, len: usize },
    /// Seek before the duration is known.
    #[error("seek unavailable until the duration is known")]
    SeekUnavailable,
}
