//! Desktop simulation of the current-sensing board.
//!
//! Runs the range controller against [`SimBoard`], whose timer fires from a
//! background thread. The notifier forwards each tick over a channel to the
//! main loop, which calls `process()`. The simulated load current is swept
//! through every range and finally past full scale to show the fail-safe.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin trcs_sim --features sim
//! ```

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trcs_control::hal::SimBoard;
use trcs_control::{TrcsConfig, TrcsController, TrcsError};

/// Load profile: (load current in uA, number of ticks to hold it).
const PROFILE: &[(i64, u32)] = &[
    (500, 30),
    (40_000, 30),
    (2_000_000, 30),
    (150_000, 40),
    (20_000_000, 20),
];

fn main() -> anyhow::Result<()> {
    println!("=================================");
    println!("  trcs-control board simulation");
    println!("=================================");
    println!();

    let config = TrcsConfig::default();
    let board = SimBoard::new(&config);
    let load = board.load();
    let mut controller = TrcsController::with_config(board, config)?;
    controller.init()?;

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    controller.start(Some(Arc::new(move || {
        let _ = tx.lock().map(|tx| tx.send(()));
    })))?;

    'profile: for &(load_ua, ticks) in PROFILE {
        load.set_ua(load_ua);
        println!("load set to {} uA", load_ua);

        for _ in 0..ticks {
            rx.recv_timeout(Duration::from_secs(1))?;
            match controller.process() {
                Ok(()) => {}
                Err(TrcsError::Overflow) => {
                    println!("  overload: every range switched off");
                    break 'profile;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let status = controller.status();
        println!(
            "  state {:?}, average {} mV, Iout {} uA",
            status.range_state, status.average_mv, status.output_current_ua
        );
    }

    controller.stop()?;
    println!("stopped, state {:?}", controller.range_state());
    controller.deinit()?;
    Ok(())
}
