//! Range arbitration state machine.
//!
//! Decides, once per processing tick, whether the active range has to move
//! one step based on the smoothed sense voltage, and sequences the vacated
//! range out of service.
//!
//! # Hysteresis
//!
//! The up-threshold sits just below ADC full scale; the down-threshold is
//! about 0.5% of it. An average anywhere between the two holds the current
//! range.
//!
//! # Overlap and recovery
//!
//! On a switch the new range is enabled while the previous one stays on.
//! The vacated range gets a pending switch request and a timer:
//!
//! ```text
//! tick:        0         1          2
//! timer_ms:    0        100        200
//! vacated:  enabled   disabled   released (pending cleared)
//! ```
//!
//! While any request is pending no further step is taken.
//!
//! # Example
//!
//! ```rust
//! use trcs_control::arbitration::{Decision, RangeArbiter};
//! use trcs_control::{Range, RangeState, TrcsConfig};
//!
//! let config = TrcsConfig::default();
//! let mut arbiter = RangeArbiter::new(&config);
//! arbiter.reset(RangeState::High);
//!
//! assert_eq!(arbiter.decide(1500), Decision::Hold);
//! assert_eq!(arbiter.decide(0), Decision::Step(Range::Middle));
//! assert_eq!(arbiter.decide(3250), Decision::Overflow);
//! ```

use log::debug;

use crate::config::TrcsConfig;
use crate::range::{Range, RangeState, RANGE_COUNT};
use crate::traits::TrcsHardware;

/// Switch bookkeeping of one range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeContext {
    /// The range was vacated and is being phased out.
    pub switch_request_pending: bool,
    /// Time since the range was vacated.
    pub switch_timer_ms: u32,
}

/// Outcome of the threshold decision for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Keep the current range.
    Hold,
    /// Move one step to this range.
    Step(Range),
    /// Stepping past [`Range::High`]: the least sensitive range is saturated.
    Overflow,
}

/// Range selection state and per-range switch timers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeArbiter {
    current: Range,
    previous: Range,
    contexts: [RangeContext; RANGE_COUNT],
    state: RangeState,
    switch_pending: u8,
    up_threshold_mv: i32,
    down_threshold_mv: i32,
    recovery_delay_ms: u32,
    release_delay_ms: u32,
}

impl RangeArbiter {
    /// Creates a disabled arbiter with thresholds and delays from `config`.
    pub fn new(config: &TrcsConfig) -> Self {
        Self {
            current: Range::High,
            previous: Range::High,
            contexts: [RangeContext::default(); RANGE_COUNT],
            state: RangeState::None,
            switch_pending: 0,
            up_threshold_mv: config.up_threshold_mv(),
            down_threshold_mv: config.down_threshold_mv(),
            recovery_delay_ms: config.recovery_delay_ms,
            release_delay_ms: config.release_delay_ms(),
        }
    }

    /// Returns to [`Range::High`] with no pending switches.
    pub fn reset(&mut self, state: RangeState) {
        self.current = Range::High;
        self.previous = Range::High;
        self.state = state;
        self.switch_pending = 0;
        self.contexts = [RangeContext::default(); RANGE_COUNT];
    }

    /// Adds one tick period to every pending switch timer.
    pub fn advance_timers(&mut self, period_ms: u32) {
        for ctx in self.contexts.iter_mut().filter(|c| c.switch_request_pending) {
            ctx.switch_timer_ms = ctx.switch_timer_ms.saturating_add(period_ms);
        }
    }

    /// Threshold decision on the smoothed average.
    ///
    /// At most one step, and none while a switch is pending.
    pub fn decide(&self, average_mv: i32) -> Decision {
        if self.switch_pending > 0 {
            return Decision::Hold;
        }
        if average_mv > self.up_threshold_mv {
            match self.current.higher() {
                Some(range) => Decision::Step(range),
                None => Decision::Overflow,
            }
        } else if average_mv < self.down_threshold_mv {
            self.current.lower().map_or(Decision::Hold, Decision::Step)
        } else {
            Decision::Hold
        }
    }

    /// Makes `range` the current range. Takes effect on the next
    /// [`apply`](Self::apply).
    pub fn select(&mut self, range: Range) {
        self.current = range;
    }

    /// Drives the range outputs for this tick.
    ///
    /// Enables a newly selected range and opens the overlap window on the
    /// vacated one, then runs recovery on every pending range. Returns on the
    /// first failing write.
    pub fn apply<H: TrcsHardware>(&mut self, hw: &mut H) -> Result<(), H::Error> {
        if self.current != self.previous {
            hw.set_range_enabled(self.current, true)?;
            self.state = self.current.into();
            debug!("range {} -> {}", self.previous, self.current);

            let vacated = &mut self.contexts[self.previous.index()];
            vacated.switch_timer_ms = 0;
            vacated.switch_request_pending = true;
            self.switch_pending += 1;
        }

        for range in Range::ALL {
            let ctx = self.contexts[range.index()];
            if !ctx.switch_request_pending {
                continue;
            }
            if ctx.switch_timer_ms >= self.recovery_delay_ms {
                hw.set_range_enabled(range, false)?;
            }
            if ctx.switch_timer_ms >= self.release_delay_ms {
                self.contexts[range.index()] = RangeContext::default();
                self.switch_pending = self.switch_pending.saturating_sub(1);
                debug!("range {} released", range);
            }
        }
        Ok(())
    }

    /// Records the current range as the previous one. Runs at the end of
    /// every tick, including failed ones.
    pub fn commit_previous(&mut self) {
        self.previous = self.current;
    }

    /// Range currently selected.
    pub fn current(&self) -> Range {
        self.current
    }

    /// Range selected at the end of the last tick.
    pub fn previous(&self) -> Range {
        self.previous
    }

    /// Observable range state.
    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Number of ranges in their overlap or recovery window.
    pub fn switch_pending(&self) -> u8 {
        self.switch_pending
    }

    /// Switch bookkeeping of `range`.
    pub fn context(&self, range: Range) -> RangeContext {
        self.contexts[range.index()]
    }

    /// Up-threshold in millivolts.
    pub fn up_threshold_mv(&self) -> i32 {
        self.up_threshold_mv
    }

    /// Down-threshold in millivolts.
    pub fn down_threshold_mv(&self) -> i32 {
        self.down_threshold_mv
    }
}
