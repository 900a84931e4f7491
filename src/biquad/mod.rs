use crate::consts::{COEFFS_PER_SOS, HISTORY_LEN};
use crate::error::Error;
use crate::sample::Sample;

/// Coefficients for one second-order section, in the order
/// `[b0, b1, b2, a1, a2]`.
///
/// It is assumed that the `a0` coefficient is always normalized to 1, and thus
/// not included.
///
/// The feedback coefficients `a1` and `a2` are stored exactly as supplied and
/// are *subtracted* from the outputs in [`process_sample`]. They are never
/// checked or negated by this crate; whoever programs the section is
/// responsible for the sign convention the reference outputs were produced
/// with. Mismatched signs yield a plausible-looking but wrong response.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coefficients<S>
where
    S: Sample,
{
    // Transfer function numerator coefficients.
    pub b0: S,
    pub b1: S,
    pub b2: S,

    // Transfer function denominator coefficients, pre-negated.
    pub a1: S,
    pub a2: S,
}

impl<S> Coefficients<S>
where
    S: Sample,
{
    /// All-zero coefficients. A section programmed with these always outputs
    /// [`Sample::EQUILIBRIUM`].
    pub const ZERO: Self = Self {
        b0: S::EQUILIBRIUM,
        b1: S::EQUILIBRIUM,
        b2: S::EQUILIBRIUM,
        a1: S::EQUILIBRIUM,
        a2: S::EQUILIBRIUM,
    };

    /// Coefficients `[1, 0, 0, 0, 0]`, which pass the input through unchanged.
    pub fn passthrough() -> Self {
        Self {
            b0: S::one(),
            ..Self::ZERO
        }
    }

    pub fn from_array([b0, b1, b2, a1, a2]: [S; COEFFS_PER_SOS]) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    pub fn into_array(self) -> [S; COEFFS_PER_SOS] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }
}

impl<S: Sample> Default for Coefficients<S> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<S: Sample> From<[S; COEFFS_PER_SOS]> for Coefficients<S> {
    fn from(value: [S; COEFFS_PER_SOS]) -> Self {
        Self::from_array(value)
    }
}

impl<S: Sample> TryFrom<&[S]> for Coefficients<S> {
    type Error = Error;

    fn try_from(value: &[S]) -> Result<Self, Self::Error> {
        let array: [S; COEFFS_PER_SOS] =
            value.try_into().map_err(|_| Error::CoefficientCount {
                expected: COEFFS_PER_SOS,
                found: value.len(),
            })?;

        Ok(Self::from_array(array))
    }
}

/// The two carried state values of a transposed direct-form II section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct History<S>
where
    S: Sample,
{
    pub s1: S,
    pub s2: S,
}

impl<S> History<S>
where
    S: Sample,
{
    pub const EQUILIBRIUM: Self = Self {
        s1: S::EQUILIBRIUM,
        s2: S::EQUILIBRIUM,
    };

    pub fn into_array(self) -> [S; HISTORY_LEN] {
        [self.s1, self.s2]
    }

    pub fn is_equilibrium(&self) -> bool {
        *self == Self::EQUILIBRIUM
    }
}

impl<S: Sample> Default for History<S> {
    fn default() -> Self {
        Self::EQUILIBRIUM
    }
}

/// Runs one input sample through a second-order section in transposed
/// direct-form II, updating `history` in place and returning the output.
///
/// ```text
/// y  = b0*x + s1
/// s1 = b1*x - a1*y + s2
/// s2 = b2*x - a2*y
/// ```
///
/// All operations wrap on overflow.
///
/// ```
/// use sosbank::biquad::{process_sample, Coefficients, History};
///
/// let coeffs = Coefficients::from_array([2, 1, 1, 0, 0]);
/// let mut history = History::EQUILIBRIUM;
///
/// assert_eq!(process_sample(&coeffs, &mut history, 10), 20);
/// assert_eq!(history, History { s1: 10, s2: 10 });
/// assert_eq!(process_sample(&coeffs, &mut history, 5), 20);
/// ```
#[inline]
pub fn process_sample<S>(coeffs: &Coefficients<S>, history: &mut History<S>, x: S) -> S
where
    S: Sample,
{
    let y = x.mul_add_wrapping(coeffs.b0, history.s1);

    history.s1 = x
        .mul_add_wrapping(coeffs.b1, history.s2)
        .wrapping_sub(&coeffs.a1.wrapping_mul(&y));
    history.s2 = coeffs
        .b2
        .wrapping_mul(&x)
        .wrapping_sub(&coeffs.a2.wrapping_mul(&y));

    y
}

/// A single second-order section: its programmed coefficients plus the
/// history that only this section reads and writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Biquad<S>
where
    S: Sample,
{
    coeffs: Coefficients<S>,

    // Since biquad filters are second-order, we require two historical values.
    // This state is updated each time the section processes a sample.
    history: History<S>,
}

impl<S> Biquad<S>
where
    S: Sample,
{
    pub const EQUILIBRIUM: Self = Self {
        coeffs: Coefficients::ZERO,
        history: History::EQUILIBRIUM,
    };

    pub fn new(coeffs: Coefficients<S>) -> Self {
        Self {
            coeffs,
            history: History::EQUILIBRIUM,
        }
    }

    pub fn coefficients(&self) -> &Coefficients<S> {
        &self.coeffs
    }

    /// Reprograms the coefficients. History is kept, so a running filter
    /// continues from its current state.
    pub fn set_coefficients(&mut self, coeffs: Coefficients<S>) {
        self.coeffs = coeffs;
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history = History::EQUILIBRIUM;
    }

    #[inline]
    pub fn process(&mut self, input: S) -> S {
        process_sample(&self.coeffs, &mut self.history, input)
    }
}

impl<S: Sample> Default for Biquad<S> {
    fn default() -> Self {
        Self::EQUILIBRIUM
    }
}
