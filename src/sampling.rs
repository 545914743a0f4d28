//! Moving average over the last N raw sense-voltage samples.
//!
//! The buffer starts zero-filled and the mean always covers all N slots, so
//! the average ramps up from zero during the first N samples.
//!
//! # Example
//!
//! ```rust
//! use trcs_control::sampling::SampleAverager;
//!
//! let mut avg = SampleAverager::<4>::new();
//! avg.push(400).unwrap();
//! assert_eq!(avg.average_mv(), 100); // (400 + 0 + 0 + 0) / 4
//!
//! for _ in 0..3 {
//!     avg.push(400).unwrap();
//! }
//! assert_eq!(avg.average_mv(), 400);
//! ```

use crate::error::AverageOverflow;

/// Default number of samples in the moving average.
pub const SAMPLE_BUFFER_SIZE: usize = 10;

/// Circular buffer of raw samples with its running mean.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleAverager<const N: usize = SAMPLE_BUFFER_SIZE> {
    buffer: [i32; N],
    index: usize,
    average_mv: i32,
}

impl<const N: usize> SampleAverager<N> {
    /// Creates a zero-filled averager.
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            index: 0,
            average_mv: 0,
        }
    }

    /// Stores `sample_mv` over the oldest slot and recomputes the mean.
    ///
    /// On overflow the sample stays in its slot but the write index and the
    /// stored average are left unchanged.
    pub fn push(&mut self, sample_mv: i32) -> Result<i32, AverageOverflow> {
        self.buffer[self.index] = sample_mv;
        self.average_mv = mean(&self.buffer)?;
        self.index = (self.index + 1) % N;
        Ok(self.average_mv)
    }

    /// Latest average in millivolts.
    pub fn average_mv(&self) -> i32 {
        self.average_mv
    }

    /// Slot the next sample will be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw buffer contents in slot order.
    pub fn samples(&self) -> &[i32; N] {
        &self.buffer
    }

    /// Zero-fills the buffer and clears the average.
    pub fn reset(&mut self) {
        self.buffer = [0; N];
        self.index = 0;
        self.average_mv = 0;
    }
}

impl<const N: usize> Default for SampleAverager<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncating integer mean with an i32 accumulator.
fn mean(values: &[i32]) -> Result<i32, AverageOverflow> {
    let count = i32::try_from(values.len()).map_err(|_| AverageOverflow)?;
    if count == 0 {
        return Ok(0);
    }
    let sum = values
        .iter()
        .try_fold(0i32, |acc, &v| acc.checked_add(v))
        .ok_or(AverageOverflow)?;
    Ok(sum / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zero_filled() {
        let avg = SampleAverager::<10>::new();
        assert_eq!(avg.average_mv(), 0);
        assert_eq!(avg.index(), 0);
        assert!(avg.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn average_is_pulled_toward_zero_until_full() {
        let mut avg = SampleAverager::<10>::new();
        let expected = [100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
        for (i, &want) in expected.iter().enumerate() {
            assert_eq!(avg.push(1000), Ok(want), "after sample {}", i + 1);
        }
        assert_eq!(avg.push(1000), Ok(1000));
    }

    #[test]
    fn average_covers_exactly_last_n_samples() {
        let mut avg = SampleAverager::<3>::new();
        let samples = [5, 9, -4, 12, 30, 7, 1];
        for (i, &s) in samples.iter().enumerate() {
            avg.push(s).unwrap();
            let start = i.saturating_sub(2);
            let window = &samples[start..=i];
            let sum: i32 = window.iter().sum();
            assert_eq!(avg.average_mv(), sum / 3);
        }
    }

    #[test]
    fn index_wraps_within_capacity() {
        let mut avg = SampleAverager::<4>::new();
        for i in 0..9 {
            assert_eq!(avg.index(), i % 4);
            avg.push(1).unwrap();
        }
        assert_eq!(avg.index(), 1);
    }

    #[test]
    fn negative_mean_truncates_toward_zero() {
        let mut avg = SampleAverager::<4>::new();
        avg.push(-5).unwrap();
        // -5 / 4
        assert_eq!(avg.average_mv(), -1);
    }

    #[test]
    fn overflow_keeps_previous_average_and_index() {
        let mut avg = SampleAverager::<2>::new();
        avg.push(i32::MAX).unwrap();
        assert_eq!(avg.average_mv(), i32::MAX / 2);
        assert_eq!(avg.index(), 1);

        assert_eq!(avg.push(1), Err(AverageOverflow));
        assert_eq!(avg.average_mv(), i32::MAX / 2);
        assert_eq!(avg.index(), 1);
        // The sample was still written to its slot.
        assert_eq!(avg.samples(), &[i32::MAX, 1]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut avg = SampleAverager::<3>::new();
        avg.push(30).unwrap();
        avg.push(60).unwrap();
        avg.reset();
        assert_eq!(avg, SampleAverager::<3>::new());
    }
}
