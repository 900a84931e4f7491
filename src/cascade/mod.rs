use crate::biquad::{Biquad, Coefficients, History};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::sample::Sample;

/// The ordered chain of `STAGES` second-order sections that filters a single
/// channel.
///
/// Stage 0 sees the channel input, and each following stage sees the output of
/// the one before it. Every stage owns its own history, so no state is shared
/// between stages or with any other [`Cascade`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cascade<S, const STAGES: usize>
where
    S: Sample,
{
    stages: [Biquad<S>; STAGES],
}

impl<S, const STAGES: usize> Cascade<S, STAGES>
where
    S: Sample,
{
    /// A cascade with all-zero coefficients and history.
    pub const EQUILIBRIUM: Self = Self {
        stages: [Biquad::EQUILIBRIUM; STAGES],
    };

    pub fn new(coeffs: [Coefficients<S>; STAGES]) -> Self {
        Self {
            stages: coeffs.map(Biquad::new),
        }
    }

    /// A cascade where every stage passes its input through unchanged.
    pub fn passthrough() -> Self {
        Self::new([Coefficients::passthrough(); STAGES])
    }

    pub fn stages(&self) -> &[Biquad<S>; STAGES] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Result<&Biquad<S>> {
        self.stages.get(index).ok_or(Error::StageOutOfRange {
            index,
            count: STAGES,
        })
    }

    fn stage_mut(&mut self, index: usize) -> Result<&mut Biquad<S>> {
        self.stages.get_mut(index).ok_or(Error::StageOutOfRange {
            index,
            count: STAGES,
        })
    }

    pub fn coefficients(&self, stage: usize) -> Result<&Coefficients<S>> {
        self.stage(stage).map(Biquad::coefficients)
    }

    pub fn set_coefficients(&mut self, stage: usize, coeffs: Coefficients<S>) -> Result<()> {
        self.stage_mut(stage)?.set_coefficients(coeffs);
        Ok(())
    }

    pub fn history(&self, stage: usize) -> Result<&History<S>> {
        self.stage(stage).map(Biquad::history)
    }

    /// Clears the history of every stage, leaving coefficients in place.
    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(Biquad::reset);
    }

    /// Filters one sample through all stages, in stage order.
    ///
    /// ```
    /// use sosbank::{Cascade, Coefficients};
    ///
    /// // Two gain-of-2 stages followed by a passthrough.
    /// let mut cascade = Cascade::<i32, 3>::new([
    ///     Coefficients::from_array([2, 0, 0, 0, 0]),
    ///     Coefficients::from_array([2, 0, 0, 0, 0]),
    ///     Coefficients::passthrough(),
    /// ]);
    ///
    /// assert_eq!(cascade.process(5), 20);
    /// ```
    #[inline]
    pub fn process(&mut self, input: S) -> S {
        self.stages
            .iter_mut()
            .fold(input, |x, stage| stage.process(x))
    }

    /// Filters each sample of `input` in increasing index order, writing the
    /// result to the same index of `output`.
    pub fn process_frame<const N: usize>(
        &mut self,
        input: &Frame<S, N>,
        output: &mut Frame<S, N>,
    ) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process(*x);
        }
    }
}

impl<S: Sample, const STAGES: usize> Default for Cascade<S, STAGES> {
    fn default() -> Self {
        Self::EQUILIBRIUM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::biquad::process_sample;

    fn coeffs(stage: i32) -> Coefficients<i32> {
        Coefficients::from_array([stage + 1, stage - 2, 3, -stage, 1])
    }

    #[test]
    fn chains_stages_in_order() {
        let mut cascade = Cascade::<i32, 4>::new([0, 1, 2, 3].map(coeffs));

        let mut histories = [History::EQUILIBRIUM; 4];
        let inputs = [3, -1, 4, 1, -5, 9, 2, -6];

        for x in inputs {
            let expected = (0..4).fold(x, |x, i| {
                process_sample(&coeffs(i as i32), &mut histories[i], x)
            });

            assert_eq!(cascade.process(x), expected);
        }

        for (i, h) in histories.iter().enumerate() {
            assert_eq!(cascade.history(i).unwrap(), h);
        }
    }

    #[test]
    fn stage_order_matters() {
        let mut forward = Cascade::<i32, 2>::new([
            Coefficients::from_array([1, 1, 0, 0, 0]),
            Coefficients::from_array([3, 0, 0, 0, 0]),
        ]);
        let mut backward = Cascade::<i32, 2>::new([
            Coefficients::from_array([3, 0, 0, 0, 0]),
            Coefficients::from_array([1, 1, 0, 0, 0]),
        ]);

        // Same output, but the state lives in a different stage.
        assert_eq!(forward.process(2), backward.process(2));
        assert_eq!(forward.history(0).unwrap().s1, 2);
        assert_eq!(backward.history(1).unwrap().s1, 6);
    }

    #[test]
    fn passthrough_frame() {
        let mut cascade = Cascade::<i32, 8>::passthrough();
        let input = Frame::from([5, -3, 0, 12, i32::MAX, i32::MIN, 1, -1]);
        let mut output = Frame::EQUILIBRIUM;

        cascade.process_frame(&input, &mut output);

        assert_eq!(output, input);
        assert!(cascade.stages().iter().all(|s| s.history().is_equilibrium()));
    }

    #[test]
    fn out_of_range_stage() {
        let mut cascade = Cascade::<i32, 8>::EQUILIBRIUM;

        assert_eq!(
            cascade.set_coefficients(8, Coefficients::passthrough()),
            Err(Error::StageOutOfRange { index: 8, count: 8 })
        );
        assert!(cascade.history(8).is_err());
        assert_eq!(cascade, Cascade::EQUILIBRIUM);
    }

    #[test]
    fn reset_clears_history_only() {
        let mut cascade = Cascade::<i32, 3>::new([1, 2, 3].map(coeffs));

        for x in 1..10 {
            cascade.process(x);
        }
        assert!(cascade.stages().iter().any(|s| !s.history().is_equilibrium()));

        cascade.reset();

        assert!(cascade.stages().iter().all(|s| s.history().is_equilibrium()));
        assert_eq!(cascade.coefficients(2).unwrap(), &coeffs(3));
    }
}
