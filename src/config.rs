//! Board configuration: timing, thresholds and conversion factors.
//!
//! # Example
//!
//! ```rust
//! use trcs_control::TrcsConfig;
//!
//! // Board defaults
//! let config = TrcsConfig::default();
//! assert_eq!(config.up_threshold_mv(), 3200);
//! assert_eq!(config.down_threshold_mv(), 16);
//!
//! // Or customize
//! let config = TrcsConfig::default()
//!     .with_adc_range_mv(2500)
//!     .with_voltage_gain(50);
//! assert!(config.validate().is_ok());
//! ```

use crate::range::{Range, RANGE_COUNT};

/// Default processing period in milliseconds.
pub const DEFAULT_PROCESS_PERIOD_MS: u32 = 100;

/// Default ADC full scale in millivolts.
pub const DEFAULT_ADC_RANGE_MV: i32 = 3300;

/// Margin below full scale at which the range steps up.
pub const DEFAULT_ADC_RANGE_MARGIN_MV: i32 = 100;

/// Time a vacated range stays enabled before it is switched off.
pub const DEFAULT_RECOVERY_DELAY_MS: u32 = 100;

/// Settling time after switch-off before the range slot is free again.
pub const DEFAULT_STABILIZATION_DELAY_MS: u32 = 100;

/// Gain of the LT6105 current-sense amplifier.
pub const DEFAULT_VOLTAGE_GAIN: u32 = 59;

/// Shunt resistors in milliohms, indexed by [`Range::index`].
pub const DEFAULT_SHUNT_RESISTOR_MOHM: [u32; RANGE_COUNT] = [50_000, 500, 5];

/// Range controller configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrcsConfig {
    /// Processing tick period in milliseconds
    pub process_period_ms: u32,
    /// ADC full scale in millivolts
    pub adc_range_mv: i32,
    /// Margin subtracted from full scale to get the up-threshold
    pub adc_range_margin_mv: i32,
    /// Delay before a vacated range is disabled
    pub recovery_delay_ms: u32,
    /// Delay after disabling before the range is released
    pub stabilization_delay_ms: u32,
    /// Sense amplifier voltage gain
    pub voltage_gain: u32,
    /// Shunt resistance per range in milliohms
    pub shunt_resistor_mohm: [u32; RANGE_COUNT],
}

impl Default for TrcsConfig {
    fn default() -> Self {
        Self {
            process_period_ms: DEFAULT_PROCESS_PERIOD_MS,
            adc_range_mv: DEFAULT_ADC_RANGE_MV,
            adc_range_margin_mv: DEFAULT_ADC_RANGE_MARGIN_MV,
            recovery_delay_ms: DEFAULT_RECOVERY_DELAY_MS,
            stabilization_delay_ms: DEFAULT_STABILIZATION_DELAY_MS,
            voltage_gain: DEFAULT_VOLTAGE_GAIN,
            shunt_resistor_mohm: DEFAULT_SHUNT_RESISTOR_MOHM,
        }
    }
}

impl TrcsConfig {
    /// Set the processing period
    pub fn with_process_period_ms(mut self, ms: u32) -> Self {
        self.process_period_ms = ms;
        self
    }

    /// Set the ADC full scale
    pub fn with_adc_range_mv(mut self, mv: i32) -> Self {
        self.adc_range_mv = mv;
        self
    }

    /// Set the full-scale margin
    pub fn with_adc_range_margin_mv(mut self, mv: i32) -> Self {
        self.adc_range_margin_mv = mv;
        self
    }

    /// Set the recovery delay
    pub fn with_recovery_delay_ms(mut self, ms: u32) -> Self {
        self.recovery_delay_ms = ms;
        self
    }

    /// Set the stabilization delay
    pub fn with_stabilization_delay_ms(mut self, ms: u32) -> Self {
        self.stabilization_delay_ms = ms;
        self
    }

    /// Set the amplifier gain
    pub fn with_voltage_gain(mut self, gain: u32) -> Self {
        self.voltage_gain = gain;
        self
    }

    /// Set the shunt resistance of one range
    pub fn with_shunt_mohm(mut self, range: Range, mohm: u32) -> Self {
        self.shunt_resistor_mohm[range.index()] = mohm;
        self
    }

    /// Average above which the controller steps toward [`Range::High`].
    pub fn up_threshold_mv(&self) -> i32 {
        self.adc_range_mv - self.adc_range_margin_mv
    }

    /// Average below which the controller steps toward [`Range::Low`].
    ///
    /// Roughly 0.5% of the up-threshold, so the band between the two is wide.
    pub fn down_threshold_mv(&self) -> i32 {
        (self.up_threshold_mv() / 100) >> 1
    }

    /// Total time a vacated range stays pending.
    pub fn release_delay_ms(&self) -> u32 {
        self.recovery_delay_ms
            .saturating_add(self.stabilization_delay_ms)
    }

    /// Shunt resistance of `range` in milliohms.
    pub fn shunt_mohm(&self, range: Range) -> u32 {
        self.shunt_resistor_mohm[range.index()]
    }

    /// Check the values the controller divides by or compares against.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.process_period_ms == 0 {
            return Err("process period must be non-zero");
        }
        if self.voltage_gain == 0 {
            return Err("voltage gain must be non-zero");
        }
        if self.shunt_resistor_mohm.iter().any(|&r| r == 0) {
            return Err("shunt resistance must be non-zero");
        }
        if self.adc_range_margin_mv < 0 || self.adc_range_margin_mv >= self.adc_range_mv {
            return Err("margin must lie within the ADC range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TrcsConfig::default();
        assert_eq!(config.process_period_ms, 100);
        assert_eq!(config.voltage_gain, 59);
        assert_eq!(config.shunt_mohm(Range::Low), 50_000);
        assert_eq!(config.shunt_mohm(Range::Middle), 500);
        assert_eq!(config.shunt_mohm(Range::High), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn thresholds_form_a_wide_band() {
        let config = TrcsConfig::default();
        assert_eq!(config.up_threshold_mv(), 3300 - 100);
        assert_eq!(config.down_threshold_mv(), (3200 / 100) >> 1);
        assert!(config.down_threshold_mv() < config.up_threshold_mv() / 100);
    }

    #[test]
    fn down_threshold_truncates() {
        let config = TrcsConfig::default().with_adc_range_mv(1299);
        // (1199 / 100) >> 1 = 11 >> 1
        assert_eq!(config.down_threshold_mv(), 5);
    }

    #[test]
    fn release_delay_is_sum_of_phases() {
        let config = TrcsConfig::default()
            .with_recovery_delay_ms(300)
            .with_stabilization_delay_ms(200);
        assert_eq!(config.release_delay_ms(), 500);
    }

    #[test]
    fn builder_pattern() {
        let config = TrcsConfig::default()
            .with_process_period_ms(50)
            .with_adc_range_margin_mv(200)
            .with_shunt_mohm(Range::Middle, 1000);
        assert_eq!(config.process_period_ms, 50);
        assert_eq!(config.up_threshold_mv(), 3100);
        assert_eq!(config.shunt_mohm(Range::Middle), 1000);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        assert!(TrcsConfig::default()
            .with_process_period_ms(0)
            .validate()
            .is_err());
        assert!(TrcsConfig::default().with_voltage_gain(0).validate().is_err());
        assert!(TrcsConfig::default()
            .with_shunt_mohm(Range::High, 0)
            .validate()
            .is_err());
        assert!(TrcsConfig::default()
            .with_adc_range_margin_mv(3300)
            .validate()
            .is_err());
        assert!(TrcsConfig::default()
            .with_adc_range_margin_mv(-1)
            .validate()
            .is_err());
    }
}
