//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Scripted test double for unit and integration tests
//! - `sim`: Desktop simulation with a thread-driven timer (requires `std` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod sim;

pub use mock::*;

#[cfg(feature = "std")]
pub use sim::*;
