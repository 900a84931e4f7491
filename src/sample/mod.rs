use core::fmt::Debug;

use num_traits::{PrimInt, Signed, WrappingAdd, WrappingMul, WrappingSub};

/// A trait for working generically across the signed integer sample formats
/// that the filter engine accepts.
///
/// All arithmetic performed on [`Sample`]s by this crate is two's-complement
/// wrapping at the width of the type. Intermediate products that overflow are
/// not saturated or reported, so results are reproducible bit-for-bit across
/// platforms and build profiles.
pub trait Sample:
    PrimInt + Signed + WrappingAdd + WrappingSub + WrappingMul + Debug + Send + Sync + 'static
{
    /// The equilibrium value for the wave that this sample type represents,
    /// i.e. the "zero amplitude" value. Histories and unconfigured
    /// coefficients start out at this value.
    const EQUILIBRIUM: Self;

    /// Multiplies `self` by `coeff` and adds `acc`, wrapping on overflow.
    #[inline]
    fn mul_add_wrapping(self, coeff: Self, acc: Self) -> Self {
        coeff.wrapping_mul(&self).wrapping_add(&acc)
    }
}

/// A macro used to simplify the implementation of [`Sample`].
macro_rules! impl_sample {
    ($($T:ty: { EQUILIBRIUM: $EQUILIBRIUM:expr }),* $(,)?) => {
        $(
            impl Sample for $T {
                const EQUILIBRIUM: Self = $EQUILIBRIUM;
            }
        )*
    }
}

// Implements [`Sample`] for all of the following primitive types.
impl_sample! {
    i8:   { EQUILIBRIUM: 0 },
    i16:  { EQUILIBRIUM: 0 },
    i32:  { EQUILIBRIUM: 0 },
    i64:  { EQUILIBRIUM: 0 },
    i128: { EQUILIBRIUM: 0 },
}
