//! Hardware abstraction for the current-sensing board.
//!
//! The controller never touches registers itself. Everything physical goes
//! through [`TrcsHardware`], supplied when the controller is built: the
//! mock in [`crate::hal::mock`] for tests, the desktop simulation in
//! `hal::sim`, or a board-specific implementation.
//!
//! # Key Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`hw_init`](TrcsHardware::hw_init) / [`hw_deinit`](TrcsHardware::hw_deinit) | Claim and release peripherals |
//! | [`timer_start`](TrcsHardware::timer_start) / [`timer_stop`](TrcsHardware::timer_stop) | Periodic processing tick |
//! | [`set_range_enabled`](TrcsHardware::set_range_enabled) | Range enable GPIO |
//! | [`read_sample_mv`](TrcsHardware::read_sample_mv) | One ADC sample of the sense output |
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use trcs_control::traits::TrcsHardware;
//! use trcs_control::{Range, TickSignal};
//!
//! struct MyBoard { /* peripheral handles */ }
//!
//! impl TrcsHardware for MyBoard {
//!     type Error = ();
//!
//!     fn hw_init(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn hw_deinit(&mut self) -> Result<(), ()> { Ok(()) }
//!
//!     fn timer_start(&mut self, period_ms: u32, tick: TickSignal) -> Result<(), ()> {
//!         // Configure the timer and call tick.raise() from its interrupt...
//!         Ok(())
//!     }
//!
//!     fn timer_stop(&mut self) -> Result<(), ()> { Ok(()) }
//!
//!     fn set_range_enabled(&mut self, range: Range, enabled: bool) -> Result<(), ()> {
//!         // Drive the range enable pin...
//!         Ok(())
//!     }
//!
//!     fn read_sample_mv(&mut self) -> Result<i32, ()> {
//!         // Convert one ADC sample to millivolts...
//!         Ok(0)
//!     }
//! }
//! ```

use crate::range::Range;
use crate::tick::TickSignal;

/// Hardware-access layer of the board.
///
/// All calls are expected to be fast and non-blocking.
pub trait TrcsHardware {
    /// Error type reported by the hardware layer.
    type Error;

    /// Claim and configure the board peripherals.
    fn hw_init(&mut self) -> Result<(), Self::Error>;

    /// Release the board peripherals.
    fn hw_deinit(&mut self) -> Result<(), Self::Error>;

    /// Start the periodic timer.
    ///
    /// The implementation must call [`TickSignal::raise`] once per
    /// `period_ms` until [`timer_stop`](Self::timer_stop) is called.
    fn timer_start(&mut self, period_ms: u32, tick: TickSignal) -> Result<(), Self::Error>;

    /// Stop the periodic timer.
    fn timer_stop(&mut self) -> Result<(), Self::Error>;

    /// Enable or disable the front end of one range.
    fn set_range_enabled(&mut self, range: Range, enabled: bool) -> Result<(), Self::Error>;

    /// Read one raw sample of the sense voltage in millivolts.
    fn read_sample_mv(&mut self) -> Result<i32, Self::Error>;

    /// Drive every range output: `high` for [`Range::High`], off for the rest.
    ///
    /// Stops at the first failing write.
    fn set_off_state(&mut self, high: bool) -> Result<(), Self::Error> {
        self.set_range_enabled(Range::High, high)?;
        self.set_range_enabled(Range::Middle, false)?;
        self.set_range_enabled(Range::Low, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec::Vec;

    struct RecordingBoard {
        writes: Vec<(Range, bool)>,
        fail_on: Option<Range>,
    }

    impl RecordingBoard {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                fail_on: None,
            }
        }
    }

    impl TrcsHardware for RecordingBoard {
        type Error = Range;

        fn hw_init(&mut self) -> Result<(), Range> {
            Ok(())
        }

        fn hw_deinit(&mut self) -> Result<(), Range> {
            Ok(())
        }

        fn timer_start(&mut self, _period_ms: u32, _tick: TickSignal) -> Result<(), Range> {
            Ok(())
        }

        fn timer_stop(&mut self) -> Result<(), Range> {
            Ok(())
        }

        fn set_range_enabled(&mut self, range: Range, enabled: bool) -> Result<(), Range> {
            if self.fail_on == Some(range) {
                return Err(range);
            }
            self.writes.push((range, enabled));
            Ok(())
        }

        fn read_sample_mv(&mut self) -> Result<i32, Range> {
            Ok(0)
        }
    }

    #[test]
    fn set_off_state_keeps_high_enabled() {
        let mut board = RecordingBoard::new();
        board.set_off_state(true).unwrap();
        assert_eq!(
            board.writes,
            [
                (Range::High, true),
                (Range::Middle, false),
                (Range::Low, false)
            ]
        );
    }

    #[test]
    fn set_off_state_all_off() {
        let mut board = RecordingBoard::new();
        board.set_off_state(false).unwrap();
        assert!(board.writes.iter().all(|&(_, on)| !on));
        assert_eq!(board.writes.len(), 3);
    }

    #[test]
    fn set_off_state_stops_at_first_failure() {
        let mut board = RecordingBoard::new();
        board.fail_on = Some(Range::Middle);
        assert_eq!(board.set_off_state(true), Err(Range::Middle));
        assert_eq!(board.writes, [(Range::High, true)]);
    }
}
