//! Bridge between the periodic timer interrupt and the processing loop.
//!
//! The timer side holds a [`TickSignal`] and calls [`TickSignal::raise`] on
//! every period. That sets a single pending bit and invokes the notifier the
//! application registered in `start`, so the main loop knows to call
//! `process`. The controller consumes the bit with [`TickFlag::take`].
//!
//! Raises that happen before the consumer runs coalesce into one pending
//! tick. The pending bit is the only state shared with interrupt context.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use trcs_control::tick::{Notifier, TickFlag};
//!
//! let wakeups = Arc::new(AtomicUsize::new(0));
//! let counter = wakeups.clone();
//! let notifier: Notifier = Arc::new(move || {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! let flag = TickFlag::new();
//! let signal = flag.signal(notifier);
//!
//! signal.raise();
//! signal.raise();
//! assert_eq!(wakeups.load(Ordering::Relaxed), 2);
//!
//! assert!(flag.take()); // both raises drained as one tick
//! assert!(!flag.take());
//! ```

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

/// Callback invoked from the timer context to wake the processing loop.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Pending-work bit shared between the timer and the processing loop.
#[derive(Clone, Default)]
pub struct TickFlag {
    pending: Arc<AtomicBool>,
}

impl TickFlag {
    /// Creates a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the producer handle handed to the hardware timer.
    pub fn signal(&self, notifier: Notifier) -> TickSignal {
        TickSignal {
            pending: self.pending.clone(),
            notifier,
        }
    }

    /// Consumes a pending tick. Returns false when there was none.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Returns true if a tick is waiting, without consuming it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Drops any pending tick.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

impl fmt::Debug for TickFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickFlag")
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Producer side of the tick bridge, owned by the timer.
#[derive(Clone)]
pub struct TickSignal {
    pending: Arc<AtomicBool>,
    notifier: Notifier,
}

impl TickSignal {
    /// Marks a tick pending and asks for processing.
    ///
    /// Safe to call from interrupt or timer-thread context.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
        (self.notifier)();
    }
}

impl fmt::Debug for TickSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickSignal")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    fn counting_notifier() -> (Notifier, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            Arc::new(move || {
                c.fetch_add(1, Ordering::Relaxed);
            }),
            count,
        )
    }

    #[test]
    fn new_flag_is_clear() {
        let flag = TickFlag::new();
        assert!(!flag.is_pending());
        assert!(!flag.take());
    }

    #[test]
    fn raise_sets_flag_and_notifies() {
        let (notifier, count) = counting_notifier();
        let flag = TickFlag::new();
        let signal = flag.signal(notifier);

        signal.raise();
        assert!(flag.is_pending());
        assert_eq!(count.load(Ordering::Relaxed), 1);

        assert!(flag.take());
        assert!(!flag.is_pending());
    }

    #[test]
    fn raises_coalesce_into_one_tick() {
        let (notifier, count) = counting_notifier();
        let flag = TickFlag::new();
        let signal = flag.signal(notifier);

        for _ in 0..5 {
            signal.raise();
        }
        assert_eq!(count.load(Ordering::Relaxed), 5);
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn cloned_signal_shares_flag() {
        let (notifier, _) = counting_notifier();
        let flag = TickFlag::new();
        let signal = flag.signal(notifier).clone();

        signal.raise();
        assert!(flag.clone().is_pending());
        flag.clear();
        assert!(!flag.is_pending());
    }

    #[test]
    fn raise_from_another_thread() {
        let (notifier, count) = counting_notifier();
        let flag = TickFlag::new();
        let signal = flag.signal(notifier);

        std::thread::spawn(move || signal.raise()).join().unwrap();
        assert!(flag.take());
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
}
