//! Error types for the range controller.
//!
//! [`TrcsError`] is generic over the hardware collaborator's error type so
//! that I/O failures surface verbatim through [`TrcsError::Hardware`].

use core::fmt;

/// Controller error.
///
/// # Example
///
/// ```rust
/// use trcs_control::TrcsError;
///
/// let err: TrcsError<core::convert::Infallible> = TrcsError::Overflow;
/// assert_eq!(err.to_string(), "range or averaging overflow");
/// assert!(!err.is_hardware());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrcsError<E> {
    /// `start` was called without a processing notifier.
    NullCallback,
    /// Averaging accumulator overflow, or the range index stepped past
    /// [`Range::High`](crate::Range::High). The latter leaves every range
    /// disabled.
    Overflow,
    /// A range index outside the valid set.
    InvalidRange(u8),
    /// A configuration value the controller cannot work with.
    InvalidConfig(&'static str),
    /// Error reported by the hardware-access layer.
    Hardware(E),
}

impl<E> TrcsError<E> {
    /// Returns true if the error came from the hardware layer.
    pub fn is_hardware(&self) -> bool {
        matches!(self, TrcsError::Hardware(_))
    }
}

impl<E: fmt::Display> fmt::Display for TrcsError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrcsError::NullCallback => f.write_str("no processing callback registered"),
            TrcsError::Overflow => f.write_str("range or averaging overflow"),
            TrcsError::InvalidRange(index) => write!(f, "invalid range index {}", index),
            TrcsError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            TrcsError::Hardware(err) => write!(f, "hardware error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for TrcsError<E> {}

/// Out-of-domain range index, produced by `Range::try_from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidRange(pub u8);

impl<E> From<InvalidRange> for TrcsError<E> {
    fn from(err: InvalidRange) -> Self {
        TrcsError::InvalidRange(err.0)
    }
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid range index {}", self.0)
    }
}

/// The moving-average accumulator overflowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AverageOverflow;

impl<E> From<AverageOverflow> for TrcsError<E> {
    fn from(_: AverageOverflow) -> Self {
        TrcsError::Overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err: TrcsError<&str> = TrcsError::Hardware("adc timeout");
        assert_eq!(err.to_string(), "hardware error: adc timeout");

        let err: TrcsError<&str> = TrcsError::InvalidRange(7);
        assert_eq!(err.to_string(), "invalid range index 7");

        let err: TrcsError<&str> = TrcsError::NullCallback;
        assert_eq!(err.to_string(), "no processing callback registered");
    }

    #[test]
    fn conversions_from_local_errors() {
        let err: TrcsError<()> = InvalidRange(4).into();
        assert_eq!(err, TrcsError::InvalidRange(4));

        let err: TrcsError<()> = AverageOverflow.into();
        assert_eq!(err, TrcsError::Overflow);
    }

    #[test]
    fn hardware_classification() {
        assert!(TrcsError::Hardware(()).is_hardware());
        assert!(!TrcsError::<()>::Overflow.is_hardware());
    }
}
