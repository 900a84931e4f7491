//! The frame processing driver: a bank of independent channels, each with its
//! own cascade of second-order sections.

use crate::biquad::{Coefficients, History};
use crate::cascade::Cascade;
use crate::config::CoefficientMap;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::sample::Sample;

/// A bank of `CHANNELS` independent filter channels, each a [`Cascade`] of
/// `STAGES` sections, processing `N`-sample frames.
///
/// Coefficients are programmed per (channel, stage) through
/// [`set_coefficients`](Self::set_coefficients),
/// [`load_coefficients`](Self::load_coefficients) or [`apply`](Self::apply).
/// Histories start at zero, are owned by the bank, and carry over from one
/// frame to the next until [`reset`](Self::reset) is called.
///
/// ```
/// use sosbank::{Coefficients, FilterBank, Frame};
///
/// let mut bank = FilterBank::<i32, 2, 1, 2>::new();
/// bank.set_coefficients(0, 0, Coefficients::from_array([2, 1, 1, 0, 0])).unwrap();
/// bank.set_coefficients(1, 0, Coefficients::passthrough()).unwrap();
///
/// let input = [Frame::from([10, 5]), Frame::from([10, 5])];
/// let mut output = [Frame::EQUILIBRIUM; 2];
///
/// bank.process(&input, &mut output);
///
/// assert_eq!(output[0].into_array(), [20, 20]);
/// assert_eq!(output[1].into_array(), [10, 5]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterBank<S, const CHANNELS: usize, const STAGES: usize, const N: usize>
where
    S: Sample,
{
    channels: [Cascade<S, STAGES>; CHANNELS],
}

impl<S, const CHANNELS: usize, const STAGES: usize, const N: usize>
    FilterBank<S, CHANNELS, STAGES, N>
where
    S: Sample,
{
    /// Creates a bank with every coefficient and history value at zero.
    pub fn new() -> Self {
        Self {
            channels: [Cascade::EQUILIBRIUM; CHANNELS],
        }
    }

    /// Creates a bank from one fully specified cascade per channel.
    pub fn from_channels(channels: [Cascade<S, STAGES>; CHANNELS]) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Cascade<S, STAGES>; CHANNELS] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Result<&Cascade<S, STAGES>> {
        self.channels.get(index).ok_or(Error::ChannelOutOfRange {
            index,
            count: CHANNELS,
        })
    }

    fn channel_mut(&mut self, index: usize) -> Result<&mut Cascade<S, STAGES>> {
        self.channels.get_mut(index).ok_or(Error::ChannelOutOfRange {
            index,
            count: CHANNELS,
        })
    }

    fn check_index(channel: usize, stage: usize) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::ChannelOutOfRange {
                index: channel,
                count: CHANNELS,
            });
        }
        if stage >= STAGES {
            return Err(Error::StageOutOfRange {
                index: stage,
                count: STAGES,
            });
        }
        Ok(())
    }

    pub fn coefficients(&self, channel: usize, stage: usize) -> Result<&Coefficients<S>> {
        self.channel(channel)?.coefficients(stage)
    }

    pub fn history(&self, channel: usize, stage: usize) -> Result<&History<S>> {
        self.channel(channel)?.history(stage)
    }

    /// Programs one section. The section's history is left untouched.
    pub fn set_coefficients(
        &mut self,
        channel: usize,
        stage: usize,
        coeffs: Coefficients<S>,
    ) -> Result<()> {
        self.channel_mut(channel)?.set_coefficients(stage, coeffs)?;

        log::debug!(
            "programmed channel {} stage {}: {:?}",
            channel,
            stage,
            coeffs.into_array()
        );

        Ok(())
    }

    /// Programs one section from raw values ordered `[b0, b1, b2, a1, a2]`.
    pub fn load_coefficients(
        &mut self,
        channel: usize,
        stage: usize,
        values: &[S],
    ) -> Result<()> {
        Self::check_index(channel, stage)?;
        let coeffs = Coefficients::try_from(values)?;
        self.set_coefficients(channel, stage, coeffs)
    }

    /// Programs every section listed in `map`.
    ///
    /// All entries are validated before any is written, so on error the bank
    /// is left exactly as it was.
    pub fn apply(&mut self, map: &CoefficientMap<S>) -> Result<()> {
        map.validate::<CHANNELS, STAGES>()?;

        for entry in map.iter() {
            self.channel_mut(entry.channel)?
                .set_coefficients(entry.stage, entry.coeffs)?;
        }

        log::debug!("applied {} coefficient sets", map.len());

        Ok(())
    }

    /// Clears every history in the bank, leaving coefficients in place.
    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(Cascade::reset);
        log::debug!("reset all {} channels", CHANNELS);
    }

    pub fn reset_channel(&mut self, channel: usize) -> Result<()> {
        self.channel_mut(channel)?.reset();
        log::debug!("reset channel {}", channel);
        Ok(())
    }

    /// Filters one frame per channel.
    ///
    /// Channels are processed in index order and samples within each channel
    /// in increasing index order. Afterwards every history reflects exactly
    /// the samples in `input`.
    pub fn process(
        &mut self,
        input: &[Frame<S, N>; CHANNELS],
        output: &mut [Frame<S, N>; CHANNELS],
    ) {
        for ((cascade, x), y) in self.channels.iter_mut().zip(input).zip(output.iter_mut()) {
            cascade.process_frame(x, y);
        }

        log::trace!("processed {} channels x {} samples", CHANNELS, N);
    }

    /// Filters one frame for a single channel, leaving every other channel
    /// untouched.
    ///
    /// Calling this once per channel, in any order, is equivalent to one call
    /// to [`process`](Self::process).
    pub fn process_channel(
        &mut self,
        channel: usize,
        input: &Frame<S, N>,
        output: &mut Frame<S, N>,
    ) -> Result<()> {
        self.channel_mut(channel)?.process_frame(input, output);

        log::trace!("processed channel {} x {} samples", channel, N);

        Ok(())
    }

    /// Like [`process`](Self::process), but accepts per-channel buffers of
    /// any container type.
    ///
    /// Channel counts and buffer lengths are checked up front; on error no
    /// history is advanced and `output` is untouched.
    pub fn process_slices<I, O>(&mut self, input: &[I], output: &mut [O]) -> Result<()>
    where
        I: AsRef<[S]>,
        O: AsMut<[S]>,
    {
        for found in [input.len(), output.len()] {
            if found != CHANNELS {
                return Err(Error::ChannelCount {
                    expected: CHANNELS,
                    found,
                });
            }
        }

        let mut frames = [Frame::EQUILIBRIUM; CHANNELS];
        for (frame, buf) in frames.iter_mut().zip(input) {
            *frame = Frame::try_from(buf.as_ref())?;
        }
        for buf in output.iter_mut() {
            let found = buf.as_mut().len();
            if found != N {
                return Err(Error::FrameLength { expected: N, found });
            }
        }

        let mut filtered = [Frame::EQUILIBRIUM; CHANNELS];
        self.process(&frames, &mut filtered);

        for (buf, frame) in output.iter_mut().zip(filtered) {
            buf.as_mut().copy_from_slice(frame.as_slice());
        }

        Ok(())
    }

    /// Like [`process`](Self::process), but filters each channel on its own
    /// scoped worker thread.
    ///
    /// Each worker exclusively borrows one channel's cascade, input frame and
    /// output frame, so no locking is involved. Results are bit-identical to
    /// [`process`](Self::process).
    pub fn process_parallel(
        &mut self,
        input: &[Frame<S, N>; CHANNELS],
        output: &mut [Frame<S, N>; CHANNELS],
    ) -> Result<()> {
        let panicked = crossbeam::thread::scope(|scope| {
            let workers: Vec<_> = self
                .channels
                .iter_mut()
                .zip(input)
                .zip(output.iter_mut())
                .map(|((cascade, x), y)| scope.spawn(move |_| cascade.process_frame(x, y)))
                .collect();

            first_panicked(workers.into_iter().map(|worker| worker.join()))
        })
        .map_err(|_| Error::ScopePanicked)?;

        if let Some(channel) = panicked {
            return Err(Error::WorkerPanicked { channel });
        }

        log::trace!(
            "processed {} channels x {} samples in parallel",
            CHANNELS,
            N
        );

        Ok(())
    }
}

/// Drains every join result and returns the index of the first that carries a
/// panic.
fn first_panicked<T, I>(results: I) -> Option<usize>
where
    I: IntoIterator<Item = std::thread::Result<T>>,
{
    results
        .into_iter()
        .enumerate()
        .fold(None, |first, (channel, result)| {
            first.or(result.err().map(|_| channel))
        })
}

impl<S, const CHANNELS: usize, const STAGES: usize, const N: usize> Default
    for FilterBank<S, CHANNELS, STAGES, N>
where
    S: Sample,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::consts::{CHANNELS, FRAME_LENGTH, SOS_STAGES};
    use crate::Accelerator;

    fn ramp(offset: i32) -> Frame<i32, FRAME_LENGTH> {
        let mut frame = Frame::EQUILIBRIUM;
        for (i, s) in frame.iter_mut().enumerate() {
            *s = offset + (i as i32 % 7) - 3;
        }
        frame
    }

    fn lowpassish() -> Coefficients<i32> {
        Coefficients::from_array([1, 2, 1, -1, 1])
    }

    fn programmed() -> Accelerator {
        let mut bank = Accelerator::new();
        for ch in 0..CHANNELS {
            for st in 0..SOS_STAGES {
                bank.set_coefficients(ch, st, lowpassish()).unwrap();
            }
        }
        bank
    }

    #[test]
    fn zero_input_stability() {
        let mut bank = programmed();
        let input = [Frame::EQUILIBRIUM; CHANNELS];
        let mut output = [ramp(1); CHANNELS];

        bank.process(&input, &mut output);

        assert_eq!(output, [Frame::EQUILIBRIUM; CHANNELS]);
        for cascade in bank.channels() {
            assert!(cascade.stages().iter().all(|s| s.history().is_equilibrium()));
        }
    }

    #[test]
    fn identity() {
        let mut bank = Accelerator::from_channels([Cascade::passthrough(); CHANNELS]);
        let input: [_; CHANNELS] = core::array::from_fn(|ch| ramp(ch as i32 * 100));
        let mut output = [Frame::EQUILIBRIUM; CHANNELS];

        bank.process(&input, &mut output);

        assert_eq!(output, input);
    }

    #[test]
    fn history_persists_across_frames() {
        let first = [ramp(5); CHANNELS];
        let second = [ramp(-2); CHANNELS];

        let mut continued = programmed();
        let mut out_a = [Frame::EQUILIBRIUM; CHANNELS];
        continued.process(&first, &mut out_a);
        assert!(!continued.history(0, 0).unwrap().is_equilibrium());
        continued.process(&second, &mut out_a);

        let mut fresh = programmed();
        let mut out_b = [Frame::EQUILIBRIUM; CHANNELS];
        fresh.process(&second, &mut out_b);

        assert_ne!(out_a, out_b);

        // After a reset the bank behaves like a fresh one again.
        continued.reset();
        continued.process(&second, &mut out_a);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn channels_are_independent() {
        let mut bank = programmed();
        let input = [ramp(3); CHANNELS];
        let mut before = [Frame::EQUILIBRIUM; CHANNELS];
        bank.process(&input, &mut before);

        for ch in 1..CHANNELS {
            assert_eq!(before[ch], before[0]);
            assert_eq!(bank.channel(ch).unwrap(), bank.channel(0).unwrap());
        }

        let mut changed = programmed();
        changed
            .set_coefficients(2, 4, Coefficients::from_array([7, -1, 0, 3, 2]))
            .unwrap();
        let mut after = [Frame::EQUILIBRIUM; CHANNELS];
        changed.process(&input, &mut after);

        for ch in 0..CHANNELS {
            if ch == 2 {
                assert_ne!(after[ch], before[ch]);
            } else {
                assert_eq!(after[ch], before[ch]);
            }
        }
    }

    #[test]
    fn feedforward_two_samples_in_bank() {
        let mut bank = FilterBank::<i32, 1, 1, 2>::new();
        bank.load_coefficients(0, 0, &[2, 1, 1, 0, 0]).unwrap();

        let mut output = [Frame::EQUILIBRIUM];
        bank.process(&[Frame::from([10, 5])], &mut output);

        assert_eq!(output[0].into_array(), [20, 20]);
        assert_eq!(bank.history(0, 0).unwrap(), &History { s1: 15, s2: 5 });
    }

    #[test]
    fn channel_wise_matches_whole_bank() {
        let input: [_; CHANNELS] = core::array::from_fn(|ch| ramp(ch as i32 * 3));

        let mut whole = programmed();
        let mut expected = [Frame::EQUILIBRIUM; CHANNELS];
        whole.process(&input, &mut expected);

        let mut by_channel = programmed();
        let mut output = [Frame::EQUILIBRIUM; CHANNELS];
        for ch in (0..CHANNELS).rev() {
            by_channel
                .process_channel(ch, &input[ch], &mut output[ch])
                .unwrap();
        }

        assert_eq!(output, expected);
        assert_eq!(by_channel, whole);
    }

    #[test]
    fn channel_wise_leaves_other_channels_alone() {
        let mut bank = programmed();
        let mut output = Frame::EQUILIBRIUM;

        bank.process_channel(3, &ramp(9), &mut output).unwrap();

        for ch in 0..CHANNELS {
            let untouched = bank
                .channel(ch)
                .unwrap()
                .stages()
                .iter()
                .all(|s| s.history().is_equilibrium());
            assert_eq!(untouched, ch != 3, "channel {}", ch);
        }

        let snapshot = bank.clone();
        let mut output = ramp(1);
        assert_eq!(
            bank.process_channel(CHANNELS, &ramp(9), &mut output),
            Err(Error::ChannelOutOfRange {
                index: CHANNELS,
                count: CHANNELS
            })
        );
        assert_eq!(bank, snapshot);
        assert_eq!(output, ramp(1));
    }

    #[test]
    fn first_panicked_joins_everything() {
        fn panic_payload() -> Box<dyn core::any::Any + Send> {
            Box::new("worker failed")
        }

        let mut joined = 0;
        let results = vec![Ok(()), Err(panic_payload()), Ok(()), Err(panic_payload())];
        let first = first_panicked(results.into_iter().inspect(|_| joined += 1));

        assert_eq!(first, Some(1));
        assert_eq!(joined, 4);

        assert_eq!(first_panicked(vec![Ok(()), Ok(())]), None);
    }

    #[test]
    fn rejects_bad_configuration() {
        let mut bank = programmed();
        let snapshot = bank.clone();

        assert_eq!(
            bank.set_coefficients(8, 0, Coefficients::passthrough()),
            Err(Error::ChannelOutOfRange { index: 8, count: 8 })
        );
        assert_eq!(
            bank.load_coefficients(0, 8, &[1, 0, 0, 0, 0]),
            Err(Error::StageOutOfRange { index: 8, count: 8 })
        );
        assert_eq!(
            bank.load_coefficients(0, 0, &[1, 0, 0, 0]),
            Err(Error::CoefficientCount {
                expected: 5,
                found: 4
            })
        );
        assert_eq!(
            bank.reset_channel(9),
            Err(Error::ChannelOutOfRange { index: 9, count: 8 })
        );

        assert_eq!(bank, snapshot);
    }

    #[test]
    fn process_slices_matches_frames() {
        let mut by_frames = programmed();
        let mut by_slices = programmed();

        let frames: [_; CHANNELS] = core::array::from_fn(|ch| ramp(ch as i32));
        let mut expected = [Frame::EQUILIBRIUM; CHANNELS];
        by_frames.process(&frames, &mut expected);

        let input: Vec<Vec<i32>> = frames.iter().map(|f| f.as_slice().to_vec()).collect();
        let mut output = vec![vec![0; FRAME_LENGTH]; CHANNELS];
        by_slices.process_slices(&input, &mut output).unwrap();

        for (buf, frame) in output.iter().zip(&expected) {
            assert_eq!(buf.as_slice(), frame.as_slice());
        }
        assert_eq!(by_slices, by_frames);
    }

    #[test]
    fn process_slices_validates_first() {
        let mut bank = programmed();
        let snapshot = bank.clone();

        let mut input = vec![vec![1; FRAME_LENGTH]; CHANNELS];
        let mut output = vec![vec![0; FRAME_LENGTH]; CHANNELS];

        assert_eq!(
            bank.process_slices(&input[..7], &mut output),
            Err(Error::ChannelCount {
                expected: 8,
                found: 7
            })
        );

        input[5].pop();
        assert_eq!(
            bank.process_slices(&input, &mut output),
            Err(Error::FrameLength {
                expected: FRAME_LENGTH,
                found: FRAME_LENGTH - 1
            })
        );

        input[5].push(1);
        output[0].push(0);
        assert_eq!(
            bank.process_slices(&input, &mut output),
            Err(Error::FrameLength {
                expected: FRAME_LENGTH,
                found: FRAME_LENGTH + 1
            })
        );

        assert_eq!(bank, snapshot);
        assert!(output.iter().flatten().all(|&s| s == 0));
    }

    fn arb_coeffs() -> impl Strategy<Value = Coefficients<i32>> {
        prop::array::uniform5(-50i32..50).prop_map(Coefficients::from_array)
    }

    fn arb_frame() -> impl Strategy<Value = Frame<i32, FRAME_LENGTH>> {
        prop::collection::vec(-100i32..100, FRAME_LENGTH)
            .prop_map(|v| Frame::try_from(v.as_slice()).unwrap())
    }

    fn arb_bank() -> impl Strategy<Value = Accelerator> {
        prop::collection::vec(arb_coeffs(), CHANNELS * SOS_STAGES).prop_map(|coeffs| {
            let mut bank = Accelerator::new();
            for (i, c) in coeffs.into_iter().enumerate() {
                bank.set_coefficients(i / SOS_STAGES, i % SOS_STAGES, c)
                    .unwrap();
            }
            bank
        })
    }

    proptest! {
        #[test]
        fn deterministic(
            bank in arb_bank(),
            frames in prop::collection::vec(prop::array::uniform8(arb_frame()), 1..4)
        ) {
            let mut a = bank.clone();
            let mut b = bank;

            for input in &frames {
                let mut out_a = [Frame::EQUILIBRIUM; CHANNELS];
                let mut out_b = [Frame::EQUILIBRIUM; CHANNELS];
                a.process(input, &mut out_a);
                b.process(input, &mut out_b);
                prop_assert_eq!(out_a, out_b);
            }

            prop_assert_eq!(a, b);
        }

        #[test]
        fn parallel_matches_sequential(
            bank in arb_bank(),
            frames in prop::collection::vec(prop::array::uniform8(arb_frame()), 1..4)
        ) {
            let mut seq = bank.clone();
            let mut par = bank;

            for input in &frames {
                let mut out_seq = [Frame::EQUILIBRIUM; CHANNELS];
                let mut out_par = [Frame::EQUILIBRIUM; CHANNELS];
                seq.process(input, &mut out_seq);
                par.process_parallel(input, &mut out_par).unwrap();
                prop_assert_eq!(out_seq, out_par);
            }

            prop_assert_eq!(seq, par);
        }

        #[test]
        fn identical_channels_stay_identical(
            coeffs in prop::collection::vec(arb_coeffs(), SOS_STAGES),
            frames in prop::collection::vec(arb_frame(), 1..4)
        ) {
            let mut bank = Accelerator::new();
            for ch in 0..CHANNELS {
                for (st, c) in coeffs.iter().enumerate() {
                    bank.set_coefficients(ch, st, *c).unwrap();
                }
            }

            for frame in &frames {
                let mut output = [Frame::EQUILIBRIUM; CHANNELS];
                bank.process(&[*frame; CHANNELS], &mut output);
                for ch in 1..CHANNELS {
                    prop_assert_eq!(output[ch], output[0]);
                    prop_assert_eq!(bank.channel(ch).unwrap(), bank.channel(0).unwrap());
                }
            }
        }
    }
}
