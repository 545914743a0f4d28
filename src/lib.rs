//! # trcs-control
//!
//! Control logic for a multi-range current-sensing board: selects which of
//! three analog sense ranges is active from the continuously sampled output
//! voltage, and reports the resulting current.
//!
//! ## Features
//!
//! - **Hardware abstraction**: One trait for timer, range outputs and ADC sampling
//! - **Moving average**: Fixed-size circular buffer over the raw sense voltage
//! - **Range arbitration**: Hysteresis thresholds, one step per tick, overlap window
//!   on the vacated range followed by recovery and stabilization delays
//! - **Fail-safe**: Overload on the least sensitive range switches every range off
//! - **Fixed-point conversion**: Sense voltage to microamps with a widened intermediate
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstraction
//! - `sampling` - Moving average of raw samples
//! - `arbitration` - Range selection state machine
//! - `controller` - Main controller that ties everything together
//! - `tick` - Timer interrupt to main loop signalling
//! - `hal` - Concrete implementations (mock for testing, desktop simulation)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trcs_control::{hal::MockBoard, RangeState, TrcsController};
//!
//! // Create controller with a mock board
//! let board = MockBoard::new().with_sample(1500);
//! let mut controller = TrcsController::new(board);
//!
//! controller.init().unwrap();
//! controller.start(Some(Arc::new(|| { /* wake the main loop */ }))).unwrap();
//!
//! // In the main loop, after being woken:
//! controller.hardware_mut().fire_tick(); // stands in for the timer interrupt
//! controller.process().unwrap();
//!
//! assert_eq!(controller.range_state(), RangeState::High);
//! println!("Iout: {} uA", controller.output_current_ua());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Range selection state machine with overlap and recovery sequencing.
pub mod arbitration;
/// Board configuration: timing, thresholds, conversion factors.
pub mod config;
/// Main controller coordinating sampling, arbitration and hardware.
pub mod controller;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock and simulation implementations.
pub mod hal;
/// Current-sense ranges and observable range state.
pub mod range;
/// Moving average over raw sense samples.
pub mod sampling;
/// Timer tick signalling between interrupt and main loop.
pub mod tick;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use arbitration::{Decision, RangeArbiter, RangeContext};
pub use config::TrcsConfig;
pub use controller::{current_ua, TrcsController, TrcsStatus};
pub use error::{AverageOverflow, InvalidRange, TrcsError};
pub use range::{Range, RangeState, RANGE_COUNT};
pub use sampling::{SampleAverager, SAMPLE_BUFFER_SIZE};
pub use tick::{Notifier, TickFlag, TickSignal};
pub use traits::TrcsHardware;
