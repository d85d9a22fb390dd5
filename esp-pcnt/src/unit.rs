//! # PCNT - Unit Module
//!
//! ## Overview
//! The `unit` module is responsible for configuring and handling individual
//! units of the `PCNT` peripheral. Each unit is an independent counter,
//! identified by a [`Number`]. A unit is driven through a [`PulseCounter`]
//! handle claimed from [`Pcnt::unit`](crate::Pcnt::unit): the handle applies
//! a complete [`Config`], and afterwards pauses, resumes, clears and reads
//! the counter, and enables the unit's interrupt.
//!
//! ## Lifecycle
//! ```text
//! Unconfigured --initialize--> Counting --pause/clear--> Paused
//!                                  ^                       |
//!                                  +-------resume----------+
//! ```
//! [`PulseCounter::clear`] leaves the unit paused. Call
//! [`PulseCounter::resume`] to continue counting from zero.

use enumset::{enum_set, EnumSet, EnumSetType};

use crate::{config::Config, instance::Instance, Error, Pcnt};

/// Unit number
#[derive(PartialEq, Eq, Copy, Clone, Debug, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Number {
    /// Unit 0
    Unit0 = 0,
    /// Unit 1
    Unit1 = 1,
    /// Unit 2
    Unit2 = 2,
    /// Unit 3
    Unit3 = 3,
    /// Unit 4
    Unit4 = 4,
    /// Unit 5
    Unit5 = 5,
    /// Unit 6
    Unit6 = 6,
    /// Unit 7
    Unit7 = 7,
}

impl Number {
    /// Every unit number, in register order.
    pub const ALL: [Number; 8] = [
        Number::Unit0,
        Number::Unit1,
        Number::Unit2,
        Number::Unit3,
        Number::Unit4,
        Number::Unit5,
        Number::Unit6,
        Number::Unit7,
    ];

    /// The register index of this unit.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks up a unit by register index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Watch point events of a pulse counter unit.
///
/// The discriminants are the bit positions of the events in the unit's status
/// word.
#[derive(Debug, EnumSetType)]
#[enumset(repr = "u32")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The count reached threshold 1.
    Threshold1 = 2,
    /// The count reached threshold 0.
    Threshold0 = 3,
    /// The count reached the low limit.
    LowLimit   = 4,
    /// The count reached the high limit.
    HighLimit  = 5,
    /// The count reached zero.
    Zero       = 6,
}

/// The events watched after [`PulseCounter::initialize`].
pub const DEFAULT_EVENTS: EnumSet<Event> = enum_set!(
    Event::Threshold1 | Event::Threshold0 | Event::Zero | Event::HighLimit | Event::LowLimit
);

const ZERO_MODE_MASK: u32 = 0b11;

/// the current status of the counter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ZeroMode {
    /// pulse counter decreases from positive to 0.
    #[default]
    PosZero  = 0,
    /// pulse counter increases from negative to 0
    NegZero  = 1,
    /// pulse counter is negative
    Negative = 2,
    /// pulse counter is positive
    Positive = 3,
}

impl ZeroMode {
    /// Extracts the zero mode from a raw status word.
    pub fn from_status(status: u32) -> Self {
        match status & ZERO_MODE_MASK {
            0 => Self::PosZero,
            1 => Self::NegZero,
            2 => Self::Negative,
            _ => Self::Positive,
        }
    }

    /// The zero mode encoded into a status word.
    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Events that can occur in a pulse counter unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events {
    /// Set when the pulse counter reaches the low limit.
    pub low_limit: bool,
    /// Set when the pulse counter reaches the high limit.
    pub high_limit: bool,
    /// Set when the pulse counter crosses threshold 0.
    pub threshold0: bool,
    /// Set when the pulse counter crosses threshold 1.
    pub threshold1: bool,
    /// Set when the pulse counter reaches zero.
    pub zero: bool,
}

impl Events {
    /// Decodes the event bits of a raw status word.
    pub fn from_status(status: u32) -> Self {
        EnumSet::<Event>::from_repr_truncated(status).into()
    }
}

impl From<EnumSet<Event>> for Events {
    fn from(events: EnumSet<Event>) -> Self {
        Self {
            low_limit: events.contains(Event::LowLimit),
            high_limit: events.contains(Event::HighLimit),
            threshold0: events.contains(Event::Threshold0),
            threshold1: events.contains(Event::Threshold1),
            zero: events.contains(Event::Zero),
        }
    }
}

/// Where a [`PulseCounter`] is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No configuration was applied through this handle yet.
    Unconfigured,
    /// Configured, the count is frozen.
    Paused,
    /// Configured and counting.
    Counting,
}

/// Controller of a single pulse counter unit.
///
/// At most one `PulseCounter` exists per unit. Dropping it releases the unit
/// so that it can be claimed again; the hardware keeps its configuration and
/// keeps counting.
pub struct PulseCounter<'d, I: Instance> {
    pcnt: &'d Pcnt<I>,
    number: Number,
    state: State,
}

impl<'d, I: Instance> PulseCounter<'d, I> {
    pub(crate) fn new(pcnt: &'d Pcnt<I>, number: Number) -> Self {
        Self {
            pcnt,
            number,
            state: State::Unconfigured,
        }
    }

    /// The unit this handle controls.
    pub fn number(&self) -> Number {
        self.number
    }

    /// The lifecycle state of the unit.
    pub fn state(&self) -> State {
        self.state
    }

    /// Applies `config` and starts counting from zero.
    ///
    /// The configuration is validated before any register is written; on
    /// error the unit is left exactly as it was. On success the unit watches
    /// [`DEFAULT_EVENTS`] and counts from 0.
    ///
    /// Initializing an already configured unit replaces its configuration.
    pub fn initialize(&mut self, config: &Config) -> Result<(), Error> {
        let unit = self.number;
        let channel = config.channel;

        self.pcnt.with_instance(|pcnt| {
            config.validate(|pin| pcnt.is_input_pin(pin))?;

            pcnt.reset_config(unit);
            pcnt.set_channel_modes(unit, channel, &config.channel_config);
            pcnt.set_edge_signal(
                unit,
                channel,
                config.edge_signal,
                config.channel_config.invert_sig,
            );
            pcnt.set_ctrl_signal(
                unit,
                channel,
                config.ctrl_signal,
                config.channel_config.invert_ctrl,
            );
            pcnt.set_limits(unit, config.low_limit, config.high_limit);
            pcnt.set_thresholds(unit, config.threshold0, config.threshold1);
            pcnt.set_filter(unit, config.filter);

            pcnt.pause(unit);
            pcnt.clear(unit);
            pcnt.set_events(unit, DEFAULT_EVENTS);
            pcnt.resume(unit);

            Ok::<(), Error>(())
        })
        .inspect_err(|e| warn!("PCNT unit {:?} not initialized: {:?}", unit, e))?;

        debug!("PCNT unit {:?} counting on {:?}", unit, channel);
        self.state = State::Counting;
        Ok(())
    }

    /// Pauses the counter and resets the count to zero.
    ///
    /// The unit stays paused; pulses arriving afterwards are not counted
    /// until [`resume`](Self::resume) is called.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| {
            pcnt.pause(unit);
            pcnt.clear(unit);
        });

        trace!("PCNT unit {:?} cleared", unit);
        self.state = State::Paused;
        Ok(())
    }

    /// Pause the counter
    pub fn pause(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| pcnt.pause(unit));
        self.state = State::Paused;
        Ok(())
    }

    /// Resume the counter
    pub fn resume(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| pcnt.resume(unit));
        self.state = State::Counting;
        Ok(())
    }

    /// Get the current counter value.
    ///
    /// Does not pause counting; the value may be outdated by the time it is
    /// used.
    pub fn read(&self) -> Result<i16, Error> {
        self.ensure_configured()?;

        let unit = self.number;
        Ok(self.pcnt.with_instance(|pcnt| pcnt.counter(unit)))
    }

    /// Get the latest events for this unit.
    pub fn events(&self) -> Result<Events, Error> {
        Ok(Events::from_status(self.status()?))
    }

    /// Get the mode of the last zero crossing
    pub fn zero_mode(&self) -> Result<ZeroMode, Error> {
        Ok(ZeroMode::from_status(self.status()?))
    }

    /// Enable interrupts for this unit.
    ///
    /// Events of a listening unit are delivered by
    /// [`Pcnt::handle_interrupt`](crate::Pcnt::handle_interrupt).
    pub fn listen(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| pcnt.set_listening(unit, true));
        Ok(())
    }

    /// Disable interrupts for this unit.
    pub fn unlisten(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| pcnt.set_listening(unit, false));
        Ok(())
    }

    /// Returns true if an interrupt is active for this unit.
    pub fn interrupt_is_set(&self) -> Result<bool, Error> {
        self.ensure_configured()?;

        let unit = self.number;
        Ok(self.pcnt.with_instance(|pcnt| pcnt.interrupt_is_set(unit)))
    }

    /// Clear the interrupt bit for this unit.
    pub fn reset_interrupt(&mut self) -> Result<(), Error> {
        self.ensure_configured()?;

        let unit = self.number;
        self.pcnt.with_instance(|pcnt| pcnt.reset_interrupt(unit));
        Ok(())
    }

    fn status(&self) -> Result<u32, Error> {
        self.ensure_configured()?;

        let unit = self.number;
        Ok(self.pcnt.with_instance(|pcnt| pcnt.status(unit)))
    }

    fn ensure_configured(&self) -> Result<(), Error> {
        match self.state {
            State::Unconfigured => Err(Error::NotInitialized),
            State::Paused | State::Counting => Ok(()),
        }
    }
}

impl<I: Instance> Drop for PulseCounter<'_, I> {
    fn drop(&mut self) {
        self.pcnt.release(self.number);
    }
}
