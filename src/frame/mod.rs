use crate::error::Error;
use crate::sample::Sample;

/// A fixed-length block of `N` consecutive samples for a single channel.
///
/// This is the unit of work handed to the filter bank per invocation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Frame<S: Sample, const N: usize>([S; N]);

impl<S: Sample, const N: usize> Frame<S, N> {
    /// A frame holding [`Sample::EQUILIBRIUM`] at every index.
    pub const EQUILIBRIUM: Self = Frame([S::EQUILIBRIUM; N]);

    pub fn new(samples: [S; N]) -> Self {
        Self(samples)
    }

    /// Pulls exactly `N` samples from `samples` to build a [`Frame`]. Returns
    /// [`None`] if the iterator runs out first.
    ///
    /// ```
    /// use sosbank::Frame;
    ///
    /// let mut samples = 0..10;
    ///
    /// let f: Frame<i32, 4> = Frame::from_samples(&mut samples).unwrap();
    /// assert_eq!(f.into_array(), [0, 1, 2, 3]);
    ///
    /// let f: Frame<i32, 4> = Frame::from_samples(&mut samples).unwrap();
    /// assert_eq!(f.into_array(), [4, 5, 6, 7]);
    ///
    /// assert_eq!(Frame::<i32, 4>::from_samples(&mut samples), None);
    /// ```
    pub fn from_samples<I>(samples: &mut I) -> Option<Self>
    where
        I: Iterator<Item = S>,
    {
        let mut frame = Self::EQUILIBRIUM;

        for slot in frame.0.iter_mut() {
            *slot = samples.next()?;
        }

        Some(frame)
    }

    pub fn into_array(self) -> [S; N] {
        self.0
    }

    pub fn as_slice(&self) -> &[S] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&S> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut S> {
        self.0.get_mut(index)
    }

    /// Iterates the samples in increasing index order.
    pub fn iter(&self) -> core::slice::Iter<'_, S> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, S> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<S: Sample, const N: usize> Default for Frame<S, N> {
    fn default() -> Self {
        Self::EQUILIBRIUM
    }
}

impl<S: Sample, const N: usize> From<[S; N]> for Frame<S, N> {
    fn from(value: [S; N]) -> Self {
        Self(value)
    }
}

impl<S: Sample, const N: usize> TryFrom<&[S]> for Frame<S, N> {
    type Error = Error;

    fn try_from(value: &[S]) -> Result<Self, Self::Error> {
        value.try_into().map(Self).map_err(|_| Error::FrameLength {
            expected: N,
            found: value.len(),
        })
    }
}

impl<S: Sample, const N: usize> IntoIterator for Frame<S, N> {
    type Item = S;
    type IntoIter = core::array::IntoIter<S, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, S: Sample, const N: usize> IntoIterator for &'a Frame<S, N> {
    type Item = &'a S;
    type IntoIter = core::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
