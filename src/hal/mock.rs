//! Mock board for testing without hardware.
//!
//! [`MockBoard`] records range enable writes, plays back scripted ADC
//! samples, captures the [`TickSignal`] handed to its timer so tests can
//! fire ticks on demand, and can be told to fail any collaborator call.
//!
//! # Example
//!
//! ```rust
//! use trcs_control::hal::MockBoard;
//! use trcs_control::{Range, RangeState, TrcsController};
//! use std::sync::Arc;
//!
//! let board = MockBoard::new().with_sample(1000);
//! let mut controller = TrcsController::new(board);
//! controller.init().unwrap();
//! controller.start(Some(Arc::new(|| {}))).unwrap();
//!
//! // Simulate one timer interrupt and run the processing step
//! assert!(controller.hardware_mut().fire_tick());
//! controller.process().unwrap();
//!
//! assert_eq!(controller.average_mv(), 100); // 1000 mV into a zero-filled window
//! assert_eq!(controller.range_state(), RangeState::High);
//! assert!(controller.hardware().is_enabled(Range::High));
//! ```

use core::fmt;

use heapless::{Deque, HistoryBuffer, Vec};

use crate::range::{Range, RANGE_COUNT};
use crate::tick::TickSignal;
use crate::traits::TrcsHardware;

/// Number of scripted samples the mock can hold.
pub const MOCK_SAMPLE_QUEUE: usize = 128;

/// Number of range writes kept in the mock's history.
pub const MOCK_WRITE_HISTORY: usize = 32;

/// A recorded call to [`TrcsHardware::set_range_enabled`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeWrite {
    /// Range written.
    pub range: Range,
    /// Requested output level.
    pub enabled: bool,
}

/// Failures the mock can be told to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockError {
    /// `hw_init` or `hw_deinit` failed.
    Init,
    /// Timer start or stop failed.
    Timer,
    /// Enable output write failed for this range.
    RangeWrite(Range),
    /// ADC sample read failed.
    SampleRead,
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockError::Init => f.write_str("mock init failure"),
            MockError::Timer => f.write_str("mock timer failure"),
            MockError::RangeWrite(range) => write!(f, "mock {} range write failure", range),
            MockError::SampleRead => f.write_str("mock sample read failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MockError {}

/// Mock current-sensing board.
///
/// Samples come from the scripted queue first, then fall back to
/// [`sample_mv`](Self::sample_mv). Failure flags stay set until cleared.
#[derive(Debug, Default)]
pub struct MockBoard {
    /// Sample returned once the scripted queue is empty.
    pub sample_mv: i32,
    /// Fail every sample read.
    pub fail_sample_read: bool,
    /// Fail writes to this range.
    pub fail_range: Option<Range>,
    /// Fail timer start and stop.
    pub fail_timer: bool,
    /// Fail `hw_init` and `hw_deinit`.
    pub fail_init: bool,
    /// Number of successful `hw_init` calls.
    pub init_count: usize,
    /// Number of successful `hw_deinit` calls.
    pub deinit_count: usize,
    /// Number of samples read.
    pub sample_reads: usize,
    enabled: [bool; RANGE_COUNT],
    samples: Deque<i32, MOCK_SAMPLE_QUEUE>,
    writes: HistoryBuffer<RangeWrite, MOCK_WRITE_HISTORY>,
    timer_period_ms: Option<u32>,
    tick: Option<TickSignal>,
}

impl MockBoard {
    /// Creates a mock board with every range off and a 0 mV sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback sample value.
    pub fn with_sample(mut self, sample_mv: i32) -> Self {
        self.sample_mv = sample_mv;
        self
    }

    /// Queues one scripted sample. Returns it back if the queue is full.
    pub fn queue_sample(&mut self, sample_mv: i32) -> Result<(), i32> {
        self.samples.push_back(sample_mv)
    }

    /// Queues several scripted samples, stopping at the first that does not fit.
    pub fn queue_samples(&mut self, samples_mv: &[i32]) -> Result<(), i32> {
        samples_mv.iter().try_for_each(|&s| self.queue_sample(s))
    }

    /// Scripted samples not yet consumed.
    pub fn queued_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the range output is currently enabled.
    pub fn is_enabled(&self, range: Range) -> bool {
        self.enabled[range.index()]
    }

    /// All ranges whose outputs are enabled, in index order.
    pub fn enabled_ranges(&self) -> Vec<Range, RANGE_COUNT> {
        Range::ALL
            .iter()
            .copied()
            .filter(|r| self.is_enabled(*r))
            .collect()
    }

    /// Recent range writes, oldest first.
    pub fn writes(&self) -> impl Iterator<Item = &RangeWrite> + '_ {
        self.writes.oldest_ordered()
    }

    /// Forgets the recorded range writes.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Period passed to the running timer.
    pub fn timer_period_ms(&self) -> Option<u32> {
        self.timer_period_ms
    }

    /// Returns true while the timer is started.
    pub fn is_timer_running(&self) -> bool {
        self.tick.is_some()
    }

    /// Simulates one timer interrupt. Returns false if the timer is stopped.
    pub fn fire_tick(&mut self) -> bool {
        match &self.tick {
            Some(tick) => {
                tick.raise();
                true
            }
            None => false,
        }
    }
}

impl TrcsHardware for MockBoard {
    type Error = MockError;

    fn hw_init(&mut self) -> Result<(), MockError> {
        if self.fail_init {
            return Err(MockError::Init);
        }
        self.init_count += 1;
        Ok(())
    }

    fn hw_deinit(&mut self) -> Result<(), MockError> {
        if self.fail_init {
            return Err(MockError::Init);
        }
        self.deinit_count += 1;
        Ok(())
    }

    fn timer_start(&mut self, period_ms: u32, tick: TickSignal) -> Result<(), MockError> {
        if self.fail_timer {
            return Err(MockError::Timer);
        }
        self.timer_period_ms = Some(period_ms);
        self.tick = Some(tick);
        Ok(())
    }

    fn timer_stop(&mut self) -> Result<(), MockError> {
        if self.fail_timer {
            return Err(MockError::Timer);
        }
        self.timer_period_ms = None;
        self.tick = None;
        Ok(())
    }

    fn set_range_enabled(&mut self, range: Range, enabled: bool) -> Result<(), MockError> {
        if self.fail_range == Some(range) {
            return Err(MockError::RangeWrite(range));
        }
        self.enabled[range.index()] = enabled;
        self.writes.write(RangeWrite { range, enabled });
        Ok(())
    }

    fn read_sample_mv(&mut self) -> Result<i32, MockError> {
        if self.fail_sample_read {
            return Err(MockError::SampleRead);
        }
        self.sample_reads += 1;
        Ok(self.samples.pop_front().unwrap_or(self.sample_mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::TickFlag;
    use alloc::sync::Arc;

    #[test]
    fn scripted_samples_come_first() {
        let mut board = MockBoard::new().with_sample(7);
        board.queue_samples(&[1, 2]).unwrap();
        assert_eq!(board.read_sample_mv(), Ok(1));
        assert_eq!(board.read_sample_mv(), Ok(2));
        assert_eq!(board.read_sample_mv(), Ok(7));
        assert_eq!(board.sample_reads, 3);
    }

    #[test]
    fn sample_queue_reports_overflow() {
        let mut board = MockBoard::new();
        for i in 0..MOCK_SAMPLE_QUEUE {
            board.queue_sample(i as i32).unwrap();
        }
        assert_eq!(board.queue_sample(-1), Err(-1));
    }

    #[test]
    fn range_writes_are_recorded() {
        let mut board = MockBoard::new();
        board.set_range_enabled(Range::Middle, true).unwrap();
        board.set_range_enabled(Range::Low, true).unwrap();
        board.set_range_enabled(Range::Middle, false).unwrap();

        assert_eq!(board.enabled_ranges().as_slice(), &[Range::Low]);
        let writes: alloc::vec::Vec<_> = board.writes().copied().collect();
        assert_eq!(
            writes,
            [
                RangeWrite { range: Range::Middle, enabled: true },
                RangeWrite { range: Range::Low, enabled: true },
                RangeWrite { range: Range::Middle, enabled: false },
            ]
        );

        board.clear_writes();
        assert_eq!(board.writes().count(), 0);
    }

    #[test]
    fn failure_injection() {
        let mut board = MockBoard::new();
        board.fail_sample_read = true;
        board.fail_range = Some(Range::High);
        board.fail_init = true;

        assert_eq!(board.read_sample_mv(), Err(MockError::SampleRead));
        assert_eq!(
            board.set_range_enabled(Range::High, true),
            Err(MockError::RangeWrite(Range::High))
        );
        assert!(board.set_range_enabled(Range::Low, true).is_ok());
        assert_eq!(board.hw_init(), Err(MockError::Init));
        assert_eq!(board.init_count, 0);
    }

    #[test]
    fn timer_captures_tick_signal() {
        let mut board = MockBoard::new();
        let flag = TickFlag::new();
        assert!(!board.fire_tick());

        board.timer_start(100, flag.signal(Arc::new(|| {}))).unwrap();
        assert_eq!(board.timer_period_ms(), Some(100));
        assert!(board.fire_tick());
        assert!(flag.take());

        board.timer_stop().unwrap();
        assert!(!board.is_timer_running());
        assert!(!board.fire_tick());
        assert!(!flag.is_pending());
    }
}
