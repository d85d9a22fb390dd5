//! # PCNT - unit configuration
//!
//! A [`Config`] describes everything a unit needs before it can count: which
//! channel is used, where its signals come from, how edges and control levels
//! move the count, and the values that are watched. It is immutable once
//! handed to [`PulseCounter::initialize`](crate::unit::PulseCounter::initialize);
//! changing anything means initializing again with a complete new `Config`.

use core::fmt::Display;

use crate::channel::{self, PcntSource};

/// Largest glitch filter threshold, in APB clock cycles.
pub const MAX_FILTER_THRESHOLD: u16 = 1023;

/// Pulse counter unit configuration.
///
/// There is no `Default`, every value has to be chosen.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// The channel of the unit that is configured. The other channel is left
    /// disabled.
    pub channel: channel::Number,
    /// Pulse input.
    pub edge_signal: PcntSource,
    /// Control input.
    pub ctrl_signal: PcntSource,
    /// Edge and control modes of the channel.
    pub channel_config: channel::Config,
    /// When the count rises to this value the high limit event is raised and
    /// the count is reset to 0. Must be positive.
    pub high_limit: i16,
    /// When the count drops to this value the low limit event is raised and
    /// the count is reset to 0. Must be negative.
    pub low_limit: i16,
    /// Watch point for the threshold 0 event.
    pub threshold0: i16,
    /// Watch point for the threshold 1 event.
    pub threshold1: i16,
    /// Minimum number of APB clock cycles for a pulse to be counted, or
    /// `None` to disable the glitch filter.
    pub filter: Option<u16>,
}

impl Config {
    /// Checks the configuration against the rules of the peripheral.
    ///
    /// `is_input_pin` decides which GPIOs may be routed to a unit.
    pub fn validate(&self, is_input_pin: impl Fn(u8) -> bool) -> Result<(), ConfigError> {
        for source in [self.edge_signal, self.ctrl_signal] {
            if let Some(pin) = source.pin() {
                if !is_input_pin(pin) {
                    return Err(ConfigError::InvalidPin(pin));
                }
            }
        }

        if self.low_limit >= self.high_limit {
            return Err(ConfigError::LimitsOutOfOrder);
        }
        // A non-negative low limit is reported as a high limit event by the
        // hardware, so both limits have to straddle zero.
        if !self.low_limit.is_negative() {
            return Err(ConfigError::InvalidLowLimit);
        }
        if !self.high_limit.is_positive() {
            return Err(ConfigError::InvalidHighLimit);
        }

        let range = self.low_limit..=self.high_limit;
        if !range.contains(&self.threshold0) || !range.contains(&self.threshold1) {
            return Err(ConfigError::ThresholdOutOfRange);
        }

        if matches!(self.filter, Some(threshold) if threshold > MAX_FILTER_THRESHOLD) {
            return Err(ConfigError::InvalidFilterThreshold);
        }

        Ok(())
    }
}

/// Pulse counter configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum ConfigError {
    /// The GPIO cannot be used as a pulse counter input.
    InvalidPin(u8),
    /// The low limit is not below the high limit.
    LimitsOutOfOrder,
    /// Invalid low limit - must be < 0
    InvalidLowLimit,
    /// Invalid high limit - must be > 0
    InvalidHighLimit,
    /// A threshold lies outside of the limits and could never be reached.
    ThresholdOutOfRange,
    /// Invalid filter threshold value
    InvalidFilterThreshold,
}

impl core::error::Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidPin(pin) => {
                write!(f, "GPIO{pin} cannot be used as a pulse counter input")
            }
            ConfigError::LimitsOutOfOrder => {
                write!(f, "The low limit must be below the high limit")
            }
            ConfigError::InvalidLowLimit => write!(f, "The low limit must be negative"),
            ConfigError::InvalidHighLimit => write!(f, "The high limit must be positive"),
            ConfigError::ThresholdOutOfRange => {
                write!(f, "Thresholds must lie between the low and the high limit")
            }
            ConfigError::InvalidFilterThreshold => write!(
                f,
                "The filter threshold must not exceed {MAX_FILTER_THRESHOLD} cycles"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{CtrlMode, EdgeMode, PcntInputConfig, Pull};

    fn any_pin(_: u8) -> bool {
        true
    }

    fn config() -> Config {
        Config {
            channel: channel::Number::Channel0,
            edge_signal: PcntSource::from_pin(4, PcntInputConfig { pull: Pull::Up }),
            ctrl_signal: PcntSource::from_pin(5, PcntInputConfig { pull: Pull::Up }),
            channel_config: channel::Config {
                lctrl_mode: CtrlMode::Reverse,
                hctrl_mode: CtrlMode::Keep,
                pos_edge: EdgeMode::Increment,
                neg_edge: EdgeMode::Hold,
                invert_ctrl: false,
                invert_sig: false,
            },
            high_limit: i16::MAX,
            low_limit: -10,
            threshold0: -1,
            threshold1: 1,
            filter: None,
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert_eq!(config().validate(any_pin), Ok(()));
        assert_eq!(
            Config {
                filter: Some(MAX_FILTER_THRESHOLD),
                threshold0: -10,
                ..config()
            }
            .validate(any_pin),
            Ok(())
        );
    }

    #[test]
    fn rejects_pins_the_instance_cannot_route() {
        let result = config().validate(|pin| pin != 5);
        assert_eq!(result, Err(ConfigError::InvalidPin(5)));

        let constant_ctrl = Config {
            ctrl_signal: PcntSource::always_high(),
            ..config()
        };
        assert_eq!(constant_ctrl.validate(|pin| pin != 5), Ok(()));
    }

    #[test]
    fn rejects_limits() {
        let inverted = Config {
            low_limit: 10,
            high_limit: 5,
            ..config()
        };
        assert_eq!(inverted.validate(any_pin), Err(ConfigError::LimitsOutOfOrder));

        let equal = Config {
            low_limit: 3,
            high_limit: 3,
            ..config()
        };
        assert_eq!(equal.validate(any_pin), Err(ConfigError::LimitsOutOfOrder));

        let positive_low = Config {
            low_limit: 0,
            threshold0: 1,
            ..config()
        };
        assert_eq!(
            positive_low.validate(any_pin),
            Err(ConfigError::InvalidLowLimit)
        );

        let negative_high = Config {
            low_limit: -20,
            high_limit: -5,
            threshold0: -6,
            threshold1: -7,
            ..config()
        };
        assert_eq!(
            negative_high.validate(any_pin),
            Err(ConfigError::InvalidHighLimit)
        );
    }

    #[test]
    fn rejects_unreachable_thresholds() {
        let below = Config {
            threshold0: -11,
            ..config()
        };
        assert_eq!(below.validate(any_pin), Err(ConfigError::ThresholdOutOfRange));

        let above = Config {
            high_limit: 100,
            threshold1: 101,
            ..config()
        };
        assert_eq!(above.validate(any_pin), Err(ConfigError::ThresholdOutOfRange));
    }

    #[test]
    fn rejects_filter_threshold() {
        let filtered = Config {
            filter: Some(MAX_FILTER_THRESHOLD + 1),
            ..config()
        };
        assert_eq!(
            filtered.validate(any_pin),
            Err(ConfigError::InvalidFilterThreshold)
        );
    }
}
