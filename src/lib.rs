//! An engine for a multi-channel bank of cascaded second-order-section IIR
//! filters over signed integer samples.
//!
//! Each channel of a [`FilterBank`] owns a [`Cascade`] of [`Biquad`]
//! sections. Frames of samples are pushed through every channel's cascade,
//! and each section's history carries over from one frame to the next. All
//! arithmetic wraps on overflow at the width of the [`Sample`] type.
//!
//! ```
//! use sosbank::{Accelerator, CoefficientMap, Coefficients, Frame};
//! use sosbank::consts::CHANNELS;
//!
//! let mut bank = Accelerator::new();
//! bank.apply(&CoefficientMap::uniform::<8, 8>(Coefficients::passthrough())).unwrap();
//!
//! let input = [Frame::new([7; 32]); CHANNELS];
//! let mut output = [Frame::EQUILIBRIUM; CHANNELS];
//! bank.process(&input, &mut output);
//!
//! assert_eq!(output, input);
//! ```

pub mod bank;
pub mod biquad;
pub mod cascade;
pub mod config;
pub mod consts;
pub mod error;
pub mod frame;
pub mod sample;
pub mod signal;

pub use bank::FilterBank;
pub use biquad::{Biquad, Coefficients, History};
pub use cascade::Cascade;
pub use config::CoefficientMap;
pub use error::{Error, Result};
pub use frame::Frame;
pub use sample::Sample;
pub use signal::Signal;

/// The accelerator topology: 8 channels of 8 cascaded sections over 32-sample
/// frames of `i32`.
pub type Accelerator =
    FilterBank<i32, { consts::CHANNELS }, { consts::SOS_STAGES }, { consts::FRAME_LENGTH }>;
