//! Segmenting long per-channel streams into frames and back.

use crate::bank::FilterBank;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::sample::Sample;

/// Types that yield a sequence of blocks, one [`Frame`] per channel,
/// representing a multi-channel stream.
///
/// This trait is inspired by the [`Iterator`] trait and has similar methods
/// and adaptors, but yields whole frames for all `C` channels at once.
pub trait Signal<S, const C: usize, const N: usize>
where
    S: Sample,
{
    /// Advances [`Self`] and returns the next block of frames, or [`None`] if
    /// there are no more to yield.
    fn next(&mut self) -> Option<[Frame<S, N>; C]>;

    /// Returns the `n`th block from this [`Signal`], starting at 0. This will
    /// advance the [`Signal`], so multiple calls to `nth` with the same `n`
    /// will give different results.
    fn nth(&mut self, n: usize) -> Option<[Frame<S, N>; C]> {
        self.advance_by(n).ok()?;
        self.next()
    }

    /// Borrows this [`Signal`] rather than consuming it.
    ///
    /// This is useful for applying adaptors while still retaining ownership of
    /// the original [`Signal`].
    fn by_ref(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self
    }

    /// Eagerly advances and discards `n` blocks from [`Self`]. If there are
    /// fewer than `n` blocks found, this will return `Err(x)`, where `x` is the
    /// number of blocks actually advanced. Otherwise, returns `Ok(())`.
    fn advance_by(&mut self, n: usize) -> core::result::Result<(), usize> {
        let mut left = n;
        while left > 0 {
            self.next().ok_or(n - left)?;
            left -= 1;
        }

        Ok(())
    }

    /// Runs every block of this [`Signal`] through `bank`, yielding the
    /// filtered blocks. The bank's histories carry over between blocks.
    fn filter<const STAGES: usize>(
        self,
        bank: &mut FilterBank<S, C, STAGES, N>,
    ) -> Filtered<'_, Self, S, C, STAGES, N>
    where
        Self: Sized,
    {
        Filtered { signal: self, bank }
    }
}

impl<G, S, const C: usize, const N: usize> Signal<S, C, N> for &mut G
where
    G: Signal<S, C, N> + ?Sized,
    S: Sample,
{
    #[inline]
    fn next(&mut self) -> Option<[Frame<S, N>; C]> {
        (**self).next()
    }
}

/// A [`Signal`] that slices equally long per-channel buffers into consecutive
/// frames.
///
/// Created by [`from_channels`]. A trailing run of fewer than `N` samples is
/// never yielded.
pub struct FromChannels<'a, S, const C: usize, const N: usize>
where
    S: Sample,
{
    buffers: [&'a [S]; C],
    position: usize,
}

impl<'a, S, const C: usize, const N: usize> Signal<S, C, N> for FromChannels<'a, S, C, N>
where
    S: Sample,
{
    fn next(&mut self) -> Option<[Frame<S, N>; C]> {
        if N == 0 || C == 0 {
            return None;
        }

        let mut block = [Frame::EQUILIBRIUM; C];

        for (frame, buf) in block.iter_mut().zip(&self.buffers) {
            let mut samples = buf.get(self.position..)?.iter().copied();
            *frame = Frame::from_samples(&mut samples)?;
        }

        self.position += N;
        Some(block)
    }
}

/// Creates a [`Signal`] over one buffer per channel.
///
/// All buffers must have the same length, since channels advance in lockstep.
///
/// ```
/// use sosbank::signal::{self, Signal};
///
/// let left = [1, 2, 3, 4, 5];
/// let right = [-1, -2, -3, -4, -5];
///
/// let buffers = [&left[..], &right[..]];
/// let mut sig = signal::from_channels::<i32, _, 2, 2>(&buffers).unwrap();
///
/// let block = sig.next().unwrap();
/// assert_eq!(block[0].into_array(), [1, 2]);
/// assert_eq!(block[1].into_array(), [-1, -2]);
///
/// assert!(sig.next().is_some());
///
/// // The fifth sample does not fill a frame.
/// assert!(sig.next().is_none());
/// ```
pub fn from_channels<'a, S, B, const C: usize, const N: usize>(
    buffers: &'a [B; C],
) -> Result<FromChannels<'a, S, C, N>>
where
    S: Sample,
    B: AsRef<[S]>,
{
    let buffers: [&'a [S]; C] = core::array::from_fn(|ch| buffers[ch].as_ref());
    let expected = buffers.first().map_or(0, |buf| buf.len());

    for (channel, buf) in buffers.iter().enumerate() {
        if buf.len() != expected {
            return Err(Error::StreamLength {
                channel,
                expected,
                found: buf.len(),
            });
        }
    }

    let remainder = if N == 0 { 0 } else { expected % N };
    if remainder != 0 {
        log::warn!(
            "stream of {} samples is not a multiple of {}; dropping the last {}",
            expected,
            N,
            remainder
        );
    }

    Ok(FromChannels {
        buffers,
        position: 0,
    })
}

/// A [`Signal`] adaptor that filters each block through a [`FilterBank`].
///
/// Created by [`Signal::filter`].
pub struct Filtered<'a, G, S, const C: usize, const STAGES: usize, const N: usize>
where
    S: Sample,
{
    signal: G,
    bank: &'a mut FilterBank<S, C, STAGES, N>,
}

impl<'a, G, S, const C: usize, const STAGES: usize, const N: usize> Signal<S, C, N>
    for Filtered<'a, G, S, C, STAGES, N>
where
    G: Signal<S, C, N>,
    S: Sample,
{
    fn next(&mut self) -> Option<[Frame<S, N>; C]> {
        let input = self.signal.next()?;
        let mut output = [Frame::EQUILIBRIUM; C];
        self.bank.process(&input, &mut output);
        Some(output)
    }
}

/// Drains `signal`, appending each channel's frames to the matching sink.
/// Returns the number of blocks drained.
pub fn collect_into<G, S, B, const C: usize, const N: usize>(
    mut signal: G,
    sinks: &mut [B; C],
) -> usize
where
    G: Signal<S, C, N>,
    S: Sample,
    B: Extend<S>,
{
    let mut count = 0;

    while let Some(block) = signal.next() {
        for (sink, frame) in sinks.iter_mut().zip(block) {
            sink.extend(frame);
        }
        count += 1;
    }

    count
}

/// Filters whole per-channel streams through `bank`, one frame at a time,
/// and returns the filtered streams.
///
/// Every complete frame of the input is processed; a trailing partial frame
/// is dropped.
pub fn filter_channels<S, B, const C: usize, const STAGES: usize, const N: usize>(
    bank: &mut FilterBank<S, C, STAGES, N>,
    buffers: &[B; C],
) -> Result<[Vec<S>; C]>
where
    S: Sample,
    B: AsRef<[S]>,
{
    let source = from_channels::<S, B, C, N>(buffers)?;
    let mut sinks: [Vec<S>; C] = core::array::from_fn(|_| Vec::new());

    let frames = collect_into(source.filter(bank), &mut sinks);
    log::debug!("filtered {} frames per channel", frames);

    Ok(sinks)
}
