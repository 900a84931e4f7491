//! Topology of the accelerator that [`Accelerator`](crate::Accelerator) models.

/// Number of independently filtered channels.
pub const CHANNELS: usize = 8;

/// Number of cascaded second-order sections per channel.
pub const SOS_STAGES: usize = 8;

/// Number of samples per channel handed to the driver per invocation.
pub const FRAME_LENGTH: usize = 32;

/// Coefficients per section, in order `b0, b1, b2, a1, a2`.
pub const COEFFS_PER_SOS: usize = 5;

/// History values per section (`s1`, `s2`).
pub const HISTORY_LEN: usize = 2;

/// Length of the per-channel stream buffers fed to the accelerator.
pub const BUFFER_SIZE: usize = 2048;

/// Number of whole frames in a [`BUFFER_SIZE`] stream.
pub const FRAMES_PER_BUFFER: usize = BUFFER_SIZE / FRAME_LENGTH;
