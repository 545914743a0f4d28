//! Main range controller that ties sampling, arbitration and hardware together.
//!
//! [`TrcsController`] owns the hardware layer and all control state. The
//! application drives it from a cooperative main loop:
//!
//! 1. [`init`](TrcsController::init) once, leaving the high range enabled.
//! 2. [`start`](TrcsController::start) with a notifier that wakes the loop.
//! 3. On every wake-up call [`process`](TrcsController::process). It is a
//!    no-op unless a timer tick is pending.
//! 4. Read [`range_state`](TrcsController::range_state) and
//!    [`output_current_ua`](TrcsController::output_current_ua) at any time.
//!
//! `process` takes `&mut self`, so ticks are serialized by construction. The
//! only state shared with the timer context is the pending-tick bit.
//!
//! # Example
//!
//! ```rust
//! use std::sync::mpsc;
//! use std::sync::{Arc, Mutex};
//! use trcs_control::{hal::MockBoard, RangeState, TrcsController};
//!
//! let (tx, rx) = mpsc::channel();
//! let tx = Mutex::new(tx);
//!
//! let mut controller = TrcsController::new(MockBoard::new().with_sample(590));
//! controller.init().unwrap();
//! controller
//!     .start(Some(Arc::new(move || {
//!         let _ = tx.lock().map(|tx| tx.send(()));
//!     })))
//!     .unwrap();
//!
//! // The mock stands in for the timer interrupt.
//! for _ in 0..10 {
//!     controller.hardware_mut().fire_tick();
//!     rx.recv().unwrap();
//!     controller.process().unwrap();
//! }
//!
//! assert_eq!(controller.range_state(), RangeState::High);
//! assert_eq!(controller.average_mv(), 590);
//! assert_eq!(controller.output_current_ua(), 2_000_000);
//! ```
//!
//! # Fault Handling
//!
//! An average above the up-threshold while already on the high range means
//! the board is overloaded. The controller switches every range off, resets
//! itself and reports [`TrcsError::Overflow`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use trcs_control::{hal::MockBoard, RangeState, TrcsController, TrcsError};
//!
//! let mut controller = TrcsController::new(MockBoard::new().with_sample(i32::MAX / 10));
//! controller.init().unwrap();
//! controller.start(Some(Arc::new(|| {}))).unwrap();
//!
//! controller.hardware_mut().fire_tick();
//! assert_eq!(controller.process(), Err(TrcsError::Overflow));
//! assert_eq!(controller.range_state(), RangeState::None);
//! assert!(controller.hardware().enabled_ranges().is_empty());
//! ```

use log::{error, info, warn};

use crate::arbitration::{Decision, RangeArbiter, RangeContext};
use crate::config::TrcsConfig;
use crate::error::TrcsError;
use crate::range::{Range, RangeState};
use crate::sampling::SampleAverager;
use crate::tick::{Notifier, TickFlag};
use crate::traits::TrcsHardware;

/// Multi-range current-sense controller.
///
/// # Type Parameter
///
/// - `H`: The board implementation ([`TrcsHardware`] trait)
///
/// # Thread Safety
///
/// The controller is not meant to be shared. Keep it in the main loop and let
/// the timer reach it only through the [`TickSignal`](crate::TickSignal)
/// passed to [`TrcsHardware::timer_start`].
pub struct TrcsController<H: TrcsHardware> {
    hw: H,
    config: TrcsConfig,
    tick: TickFlag,
    sampler: SampleAverager,
    arbiter: RangeArbiter,
    running: bool,
}

impl<H: TrcsHardware> TrcsController<H> {
    /// Create a controller with the default board configuration
    pub fn new(hw: H) -> Self {
        Self::build(hw, TrcsConfig::default())
    }

    /// Create a controller with a custom configuration
    pub fn with_config(hw: H, config: TrcsConfig) -> Result<Self, TrcsError<H::Error>> {
        config.validate().map_err(TrcsError::InvalidConfig)?;
        Ok(Self::build(hw, config))
    }

    fn build(hw: H, config: TrcsConfig) -> Self {
        Self {
            hw,
            arbiter: RangeArbiter::new(&config),
            config,
            tick: TickFlag::new(),
            sampler: SampleAverager::new(),
            running: false,
        }
    }

    /// Reset all state, initialize the hardware and enable the high range.
    ///
    /// The high range keeps a conduction path for the downstream load while
    /// the control loop is not yet running.
    pub fn init(&mut self) -> Result<(), TrcsError<H::Error>> {
        self.tick.clear();
        self.running = false;
        self.reset(RangeState::None);
        self.hw.hw_init().map_err(TrcsError::Hardware)?;
        self.set_off_state(true)?;
        info!("current sense controller initialized");
        Ok(())
    }

    /// Switch every range off and release the hardware.
    pub fn deinit(&mut self) -> Result<(), TrcsError<H::Error>> {
        self.set_off_state(false)?;
        self.hw.hw_deinit().map_err(TrcsError::Hardware)?;
        info!("current sense controller released");
        Ok(())
    }

    /// Start periodic processing.
    ///
    /// `notifier` is called from the timer context on every tick to ask for
    /// [`process`](Self::process). Fails with [`TrcsError::NullCallback`]
    /// when none is given.
    pub fn start(&mut self, notifier: Option<Notifier>) -> Result<(), TrcsError<H::Error>> {
        let notifier = notifier.ok_or(TrcsError::NullCallback)?;
        let signal = self.tick.signal(notifier);
        self.hw
            .timer_start(self.config.process_period_ms, signal)
            .map_err(TrcsError::Hardware)?;
        self.running = true;
        info!(
            "range control started, period {} ms",
            self.config.process_period_ms
        );
        Ok(())
    }

    /// Stop periodic processing, leaving only the high range enabled.
    pub fn stop(&mut self) -> Result<(), TrcsError<H::Error>> {
        self.set_off_state(true)?;
        self.hw.timer_stop().map_err(TrcsError::Hardware)?;
        self.tick.clear();
        self.running = false;
        info!("range control stopped");
        Ok(())
    }

    /// Run one processing tick if the timer raised one.
    pub fn process(&mut self) -> Result<(), TrcsError<H::Error>> {
        if !self.tick.take() {
            return Ok(());
        }
        self.arbiter.advance_timers(self.config.process_period_ms);
        let result = self.run_tick();
        self.arbiter.commit_previous();
        result
    }

    fn run_tick(&mut self) -> Result<(), TrcsError<H::Error>> {
        let sample_mv = self.hw.read_sample_mv().map_err(TrcsError::Hardware)?;
        let average_mv = self.sampler.push(sample_mv)?;

        match self.arbiter.decide(average_mv) {
            Decision::Hold => {}
            Decision::Step(range) => self.arbiter.select(range),
            Decision::Overflow => {
                error!("sense overload at {} mV, all ranges off", average_mv);
                self.fail_safe();
                return Err(TrcsError::Overflow);
            }
        }
        self.arbiter.apply(&mut self.hw).map_err(TrcsError::Hardware)
    }

    /// Force every range off and reset to the disabled state.
    ///
    /// Attempts every write even if one fails.
    fn fail_safe(&mut self) {
        for range in Range::ALL {
            if self.hw.set_range_enabled(range, false).is_err() {
                warn!("failed to disable {} range", range);
            }
        }
        self.reset(RangeState::None);
    }

    fn set_off_state(&mut self, high: bool) -> Result<(), TrcsError<H::Error>> {
        self.hw.set_off_state(high).map_err(TrcsError::Hardware)?;
        self.reset(if high {
            RangeState::High
        } else {
            RangeState::None
        });
        Ok(())
    }

    fn reset(&mut self, state: RangeState) {
        self.arbiter.reset(state);
        self.sampler.reset();
    }

    /// Current observable range state
    pub fn range_state(&self) -> RangeState {
        self.arbiter.state()
    }

    /// Output current in microamps from the latest average and the selected
    /// range. Does not sample.
    pub fn output_current_ua(&self) -> i32 {
        current_ua(
            self.sampler.average_mv(),
            self.config.voltage_gain,
            self.config.shunt_mohm(self.arbiter.current()),
        )
    }

    /// Latest averaged sense voltage in millivolts
    pub fn average_mv(&self) -> i32 {
        self.sampler.average_mv()
    }

    /// Range currently selected
    pub fn current_range(&self) -> Range {
        self.arbiter.current()
    }

    /// Number of ranges in their overlap or recovery window
    pub fn switch_pending(&self) -> u8 {
        self.arbiter.switch_pending()
    }

    /// Switch bookkeeping of one range
    pub fn range_context(&self, range: Range) -> RangeContext {
        self.arbiter.context(range)
    }

    /// Check if periodic processing is started
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Check if a timer tick is waiting for [`process`](Self::process)
    pub fn tick_pending(&self) -> bool {
        self.tick.is_pending()
    }

    /// Active configuration
    pub fn config(&self) -> &TrcsConfig {
        &self.config
    }

    /// Get the full state snapshot
    pub fn status(&self) -> TrcsStatus {
        TrcsStatus {
            range_state: self.range_state(),
            current_range: self.current_range(),
            average_mv: self.average_mv(),
            output_current_ua: self.output_current_ua(),
            switch_pending: self.switch_pending(),
            running: self.running,
        }
    }

    /// Borrow the hardware layer
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutably borrow the hardware layer
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Consume the controller and return the hardware layer
    pub fn into_hardware(self) -> H {
        self.hw
    }
}

/// Convert a sense voltage to current.
///
/// `current_ua = average_mv * 10^6 / (gain * shunt_mohm)`, computed in i64
/// with truncating division. The result is truncated to i32.
///
/// ```rust
/// use trcs_control::controller::current_ua;
///
/// assert_eq!(current_ua(590, 59, 5), 2_000_000);
/// assert_eq!(current_ua(1, 59, 50_000), 0);
/// ```
pub fn current_ua(average_mv: i32, voltage_gain: u32, shunt_mohm: u32) -> i32 {
    let num = i64::from(average_mv) * 1_000_000;
    let den = i64::from(voltage_gain) * i64::from(shunt_mohm);
    if den == 0 {
        return 0;
    }
    (num / den) as i32
}

/// Full state snapshot for UI/API.
///
/// Implements `serde::Serialize` when the `serde` feature is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrcsStatus {
    /// Observable range state.
    pub range_state: RangeState,
    /// Range used for the current conversion.
    pub current_range: Range,
    /// Latest averaged sense voltage (mV).
    pub average_mv: i32,
    /// Output current (µA).
    pub output_current_ua: i32,
    /// Ranges still in their overlap or recovery window.
    pub switch_pending: u8,
    /// Periodic processing started.
    pub running: bool,
}
