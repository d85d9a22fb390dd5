//! # PCNT - channel configuration
//!
//! ## Overview
//! Each pulse counter unit has two channels. A channel watches one edge
//! signal and one control signal: on every edge of the edge signal it asks
//! the unit to increment, decrement or hold the count, and the level of the
//! control signal may keep, reverse or disable that action.
//!
//! Signals are routed from a GPIO ([`PcntSource::from_pin`]) or tied to a
//! constant level ([`PcntSource::always_high`], [`PcntSource::always_low`]).

/// Channel number
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Number {
    /// Channel 0
    Channel0 = 0,
    /// Channel 1
    Channel1 = 1,
}

impl Number {
    /// All channels of a unit, in register order.
    pub const ALL: [Number; 2] = [Number::Channel0, Number::Channel1];
}

/// Action taken on the count when an edge is seen on the edge signal.
///
/// The discriminants are the hardware encoding of the mode fields.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeMode {
    /// Leave the count unchanged, i.e. counting on this edge is disabled.
    Hold      = 0,
    /// Increase the count.
    Increment = 1,
    /// Decrease the count.
    Decrement = 2,
}

/// How the level of the control signal modifies the [`EdgeMode`] action.
///
/// The discriminants are the hardware encoding of the mode fields.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CtrlMode {
    /// Keep the edge action as configured.
    Keep    = 0,
    /// Swap increment and decrement.
    Reverse = 1,
    /// Hold the count regardless of the edge action.
    Disable = 2,
}

impl CtrlMode {
    /// Applies this control mode to an edge action.
    pub fn apply(self, edge: EdgeMode) -> EdgeMode {
        match (self, edge) {
            (CtrlMode::Keep, edge) => edge,
            (CtrlMode::Disable, _) => EdgeMode::Hold,
            (CtrlMode::Reverse, EdgeMode::Increment) => EdgeMode::Decrement,
            (CtrlMode::Reverse, EdgeMode::Decrement) => EdgeMode::Increment,
            (CtrlMode::Reverse, EdgeMode::Hold) => EdgeMode::Hold,
        }
    }
}

/// Pulse Counter configuration for a single channel
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// PCNT low control mode
    pub lctrl_mode: CtrlMode,
    /// PCNT high control mode
    pub hctrl_mode: CtrlMode,
    /// PCNT signal positive edge count mode
    pub pos_edge: EdgeMode,
    /// PCNT signal negative edge count mode
    pub neg_edge: EdgeMode,
    /// Invert the control signal before it reaches the unit.
    pub invert_ctrl: bool,
    /// Invert the edge signal before it reaches the unit.
    pub invert_sig: bool,
}

impl Config {
    /// The channel modes a unit has after its configuration was reset:
    /// both edges hold, both control levels keep.
    pub const DISABLED: Config = Config {
        lctrl_mode: CtrlMode::Keep,
        hctrl_mode: CtrlMode::Keep,
        pos_edge: EdgeMode::Hold,
        neg_edge: EdgeMode::Hold,
        invert_ctrl: false,
        invert_sig: false,
    };

    /// Resolves the count action for one edge.
    ///
    /// `rising` and `ctrl_high` are the levels as seen by the unit, after any
    /// inversion has been applied.
    pub fn action(&self, rising: bool, ctrl_high: bool) -> EdgeMode {
        let edge = if rising { self.pos_edge } else { self.neg_edge };
        let ctrl = if ctrl_high {
            self.hctrl_mode
        } else {
            self.lctrl_mode
        };
        ctrl.apply(edge)
    }
}

/// Logic level of a signal.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Low
    Low,
    /// High
    High,
}

impl Level {
    /// Returns the opposite level.
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// `true` if the level is [`Level::High`].
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pull setting for an input pin.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull
    None,
    /// Pull up
    Up,
    /// Pull down
    Down,
}

/// Configuration for an PCNT input pin
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PcntInputConfig {
    /// Configuration for the internal pull-up resistors
    pub pull: Pull,
}

impl Default for PcntInputConfig {
    fn default() -> Self {
        Self { pull: Pull::None }
    }
}

/// Where a channel signal comes from.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Source {
    Pin { number: u8, config: PcntInputConfig },
    High,
    Low,
}

/// PcntSource can be always high, always low, or an actual pin
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PcntSource {
    source: Source,
}

impl PcntSource {
    /// Routes the signal from GPIO `pin`.
    pub fn from_pin(pin: u8, pin_config: PcntInputConfig) -> Self {
        Self {
            source: Source::Pin {
                number: pin,
                config: pin_config,
            },
        }
    }

    /// A signal that is always high.
    pub const fn always_high() -> Self {
        Self {
            source: Source::High,
        }
    }

    /// A signal that is always low.
    pub const fn always_low() -> Self {
        Self {
            source: Source::Low,
        }
    }

    /// The GPIO number, if this source is routed from a pin.
    pub fn pin(&self) -> Option<u8> {
        match self.source {
            Source::Pin { number, .. } => Some(number),
            _ => None,
        }
    }

    /// The input configuration, if this source is routed from a pin.
    pub fn input_config(&self) -> Option<PcntInputConfig> {
        match self.source {
            Source::Pin { config, .. } => Some(config),
            _ => None,
        }
    }

    pub(crate) fn source(&self) -> Source {
        self.source
    }
}
