use thiserror::Error;

/// Errors raised while configuring or driving a [`FilterBank`].
///
/// Filtering itself never fails: arithmetic overflow wraps. Every error here
/// describes a malformed request that was rejected before any filter state was
/// touched.
///
/// [`FilterBank`]: crate::bank::FilterBank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("channel index {index} is out of range (bank has {count} channels)")]
    ChannelOutOfRange { index: usize, count: usize },

    #[error("stage index {index} is out of range (cascade has {count} stages)")]
    StageOutOfRange { index: usize, count: usize },

    #[error("expected {expected} coefficients per stage, found {found}")]
    CoefficientCount { expected: usize, found: usize },

    #[error("expected a frame of {expected} samples, found {found}")]
    FrameLength { expected: usize, found: usize },

    #[error("expected buffers for {expected} channels, found {found}")]
    ChannelCount { expected: usize, found: usize },

    #[error("channel {channel} stream has {found} samples, expected {expected}")]
    StreamLength {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("worker for channel {channel} panicked")]
    WorkerPanicked { channel: usize },

    #[error("a channel worker panicked without being joined")]
    ScopePanicked,
}

pub type Result<T> = core::result::Result<T, Error>;
