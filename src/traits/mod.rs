//! Trait definitions for hardware abstraction.
//!
//! This module defines the seam that lets the range controller:
//! - Run on the real board
//! - Run against the desktop simulation
//! - Run against a scripted mock in tests
//!
//! # Submodules
//!
//! - `hardware`: timer, range enable outputs and ADC sampling

pub mod hardware;

pub use hardware::*;
