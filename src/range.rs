//! Current-sense ranges and the observable range state.
//!
//! The board has three analog sense paths ordered by increasing full-scale
//! current: [`Range::Low`] (largest shunt, most sensitive) up to
//! [`Range::High`] (smallest shunt, tolerates the most current).
//!
//! # Example
//!
//! ```rust
//! use trcs_control::{Range, RangeState};
//!
//! assert_eq!(Range::Low.higher(), Some(Range::Middle));
//! assert_eq!(Range::High.higher(), None);
//! assert_eq!(RangeState::from(Range::Middle), RangeState::Middle);
//! assert_eq!(Range::try_from(2u8), Ok(Range::High));
//! ```

use crate::error::InvalidRange;

/// Number of current-sense ranges on the board.
pub const RANGE_COUNT: usize = 3;

/// One of the three mutually exclusive current-sense paths.
///
/// Ordered by increasing full-scale current: stepping "up" moves toward
/// [`Range::High`], which tolerates more current at lower sensitivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Range {
    /// Most sensitive range (largest shunt).
    Low = 0,
    /// Intermediate range.
    Middle = 1,
    /// Least sensitive range (smallest shunt), the safe default.
    High = 2,
}

impl Range {
    /// All ranges in index order.
    pub const ALL: [Range; RANGE_COUNT] = [Range::Low, Range::Middle, Range::High];

    /// Position of this range in [`Range::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Next range toward higher full-scale current, `None` past [`Range::High`].
    #[inline]
    pub const fn higher(self) -> Option<Range> {
        match self {
            Range::Low => Some(Range::Middle),
            Range::Middle => Some(Range::High),
            Range::High => None,
        }
    }

    /// Next range toward higher sensitivity, `None` below [`Range::Low`].
    #[inline]
    pub const fn lower(self) -> Option<Range> {
        match self {
            Range::Low => None,
            Range::Middle => Some(Range::Low),
            Range::High => Some(Range::Middle),
        }
    }

    /// Lowercase name, for logs and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Range::Low => "low",
            Range::Middle => "middle",
            Range::High => "high",
        }
    }
}

impl TryFrom<u8> for Range {
    type Error = InvalidRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Range::Low),
            1 => Ok(Range::Middle),
            2 => Ok(Range::High),
            other => Err(InvalidRange(other)),
        }
    }
}

impl core::fmt::Display for Range {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally observable range status.
///
/// [`RangeState::None`] means every range output is disabled (idle, de-init
/// or fault). Otherwise it mirrors the active range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RangeState {
    /// All ranges disabled.
    #[default]
    None,
    /// Low range active.
    Low,
    /// Middle range active.
    Middle,
    /// High range active.
    High,
}

impl RangeState {
    /// The active range, if any.
    pub const fn range(self) -> Option<Range> {
        match self {
            RangeState::None => None,
            RangeState::Low => Some(Range::Low),
            RangeState::Middle => Some(Range::Middle),
            RangeState::High => Some(Range::High),
        }
    }
}

impl From<Range> for RangeState {
    fn from(range: Range) -> Self {
        match range {
            Range::Low => RangeState::Low,
            Range::Middle => RangeState::Middle,
            Range::High => RangeState::High,
        }
    }
}
