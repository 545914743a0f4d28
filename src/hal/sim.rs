//! Desktop simulation of the current-sensing board.
//!
//! [`SimBoard`] runs the periodic timer on a background thread and models
//! the sense path: the enabled shunts sit in parallel, the amplifier
//! multiplies the shunt voltage by the configured gain, and the ADC clips
//! at full scale. With no range enabled the sense input floats to full
//! scale. Set the load with the [`SimLoad`] handle from any thread.
//!
//! # Example
//!
//! ```rust
//! use trcs_control::hal::SimBoard;
//! use trcs_control::traits::TrcsHardware;
//! use trcs_control::{Range, TrcsConfig};
//!
//! let mut board = SimBoard::new(&TrcsConfig::default());
//! board.load().set_ua(2_000_000);
//! board.set_range_enabled(Range::High, true).unwrap();
//! assert_eq!(board.read_sample_mv().unwrap(), 590);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::config::TrcsConfig;
use crate::range::{Range, RANGE_COUNT};
use crate::tick::TickSignal;
use crate::traits::TrcsHardware;

/// Errors reported by the simulated board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimError {
    /// `timer_start` while the timer thread is already running.
    TimerRunning,
    /// The timer thread could not be spawned or joined.
    TimerThread,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::TimerRunning => f.write_str("timer already running"),
            SimError::TimerThread => f.write_str("timer thread failure"),
        }
    }
}

impl std::error::Error for SimError {}

/// Shared handle to the simulated load current.
#[derive(Clone, Debug, Default)]
pub struct SimLoad {
    current_ua: Arc<AtomicI64>,
}

impl SimLoad {
    /// Set the load current in microamps.
    pub fn set_ua(&self, current_ua: i64) {
        self.current_ua.store(current_ua, Ordering::Relaxed);
    }

    /// Load current in microamps.
    pub fn ua(&self) -> i64 {
        self.current_ua.load(Ordering::Relaxed)
    }
}

struct TimerThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Simulated board with a thread-driven timer.
pub struct SimBoard {
    load: SimLoad,
    enabled: [bool; RANGE_COUNT],
    shunt_mohm: [u32; RANGE_COUNT],
    voltage_gain: u32,
    adc_range_mv: i32,
    timer: Option<TimerThread>,
}

impl SimBoard {
    /// Creates a board with the shunts, gain and ADC range of `config`.
    pub fn new(config: &TrcsConfig) -> Self {
        Self {
            load: SimLoad::default(),
            enabled: [false; RANGE_COUNT],
            shunt_mohm: config.shunt_resistor_mohm,
            voltage_gain: config.voltage_gain,
            adc_range_mv: config.adc_range_mv,
            timer: None,
        }
    }

    /// Handle to the simulated load.
    pub fn load(&self) -> SimLoad {
        self.load.clone()
    }

    /// Returns true if the range output is currently enabled.
    pub fn is_enabled(&self, range: Range) -> bool {
        self.enabled[range.index()]
    }

    /// Sense voltage the ADC would see for the current load.
    pub fn sense_mv(&self) -> i32 {
        let conductance: f64 = Range::ALL
            .iter()
            .filter(|r| self.is_enabled(**r))
            .map(|r| 1.0 / f64::from(self.shunt_mohm[r.index()]))
            .sum();
        if conductance == 0.0 {
            return self.adc_range_mv;
        }
        let shunt_mohm = 1.0 / conductance;
        let mv = self.load.ua() as f64 * shunt_mohm * f64::from(self.voltage_gain) / 1_000_000.0;
        mv.clamp(0.0, f64::from(self.adc_range_mv)) as i32
    }
}

impl TrcsHardware for SimBoard {
    type Error = SimError;

    fn hw_init(&mut self) -> Result<(), SimError> {
        self.enabled = [false; RANGE_COUNT];
        Ok(())
    }

    fn hw_deinit(&mut self) -> Result<(), SimError> {
        self.timer_stop()
    }

    fn timer_start(&mut self, period_ms: u32, tick: TickSignal) -> Result<(), SimError> {
        if self.timer.is_some() {
            return Err(SimError::TimerRunning);
        }
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let period = Duration::from_millis(u64::from(period_ms));
        let handle = thread::Builder::new()
            .name("trcs-timer".into())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    thread::sleep(period);
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    tick.raise();
                }
            })
            .map_err(|_| SimError::TimerThread)?;
        self.timer = Some(TimerThread { stop, handle });
        debug!("sim timer started, {} ms", period_ms);
        Ok(())
    }

    fn timer_stop(&mut self) -> Result<(), SimError> {
        if let Some(timer) = self.timer.take() {
            timer.stop.store(true, Ordering::Relaxed);
            timer.handle.join().map_err(|_| SimError::TimerThread)?;
            debug!("sim timer stopped");
        }
        Ok(())
    }

    fn set_range_enabled(&mut self, range: Range, enabled: bool) -> Result<(), SimError> {
        self.enabled[range.index()] = enabled;
        Ok(())
    }

    fn read_sample_mv(&mut self) -> Result<i32, SimError> {
        Ok(self.sense_mv())
    }
}

impl Drop for SimBoard {
    fn drop(&mut self) {
        let _ = self.timer_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::TickFlag;
    use std::sync::mpsc;
    use std::sync::Mutex;

    fn board() -> SimBoard {
        SimBoard::new(&TrcsConfig::default())
    }

    #[test]
    fn floating_input_reads_full_scale() {
        let mut b = board();
        b.load().set_ua(10);
        assert_eq!(b.read_sample_mv(), Ok(3300));
    }

    #[test]
    fn single_range_sense_voltage() {
        let mut b = board();
        b.set_range_enabled(Range::Middle, true).unwrap();
        b.load().set_ua(10_000);
        // 10 mA * 0.5 ohm * 59
        assert_eq!(b.read_sample_mv(), Ok(295));
    }

    #[test]
    fn overlap_puts_shunts_in_parallel() {
        let mut b = board();
        b.set_range_enabled(Range::Middle, true).unwrap();
        b.set_range_enabled(Range::High, true).unwrap();
        b.load().set_ua(2_000_000);
        // 500 || 5 mOhm is just under 5 mOhm.
        let mv = b.read_sample_mv().unwrap();
        assert!(mv < 590 && mv > 580, "got {}", mv);
    }

    #[test]
    fn sense_clips_at_full_scale() {
        let mut b = board();
        b.set_range_enabled(Range::Low, true).unwrap();
        b.load().set_ua(1_000_000);
        assert_eq!(b.read_sample_mv(), Ok(3300));
        b.load().set_ua(-5);
        assert_eq!(b.read_sample_mv(), Ok(0));
    }

    #[test]
    fn timer_thread_raises_ticks() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let flag = TickFlag::new();
        let mut b = board();

        b.timer_start(
            5,
            flag.signal(Arc::new(move || {
                let _ = tx.lock().map(|tx| tx.send(()));
            })),
        )
        .unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(flag.take());

        assert_eq!(
            b.timer_start(5, flag.signal(Arc::new(|| {}))),
            Err(SimError::TimerRunning)
        );
        b.timer_stop().unwrap();
        b.timer_stop().unwrap();
    }
}
