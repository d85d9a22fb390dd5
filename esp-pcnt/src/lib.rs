//! # Pulse Counter (PCNT)
//!
//! ## Overview
//! The PCNT peripheral counts the rising and/or falling edges of an input
//! signal. It contains several units; each unit is an independent signed
//! 16-bit counter with two channels. A channel increments or decrements the
//! count on the edges of its edge signal, and the level of its control signal
//! can keep, reverse or disable that direction. Every unit watches a low and
//! a high limit, two thresholds and zero, and can raise an interrupt when the
//! count reaches one of them.
//!
//! This crate wraps one PCNT peripheral in a [`Pcnt`], which hands out one
//! [`PulseCounter`](unit::PulseCounter) per unit. The register accesses go
//! through the [`Instance`](instance::Instance) trait, implemented for the
//! ESP32 (`esp32` feature) and by an [emulated peripheral](emulation) that
//! runs anywhere.
//!
//! ## Examples
//! ### Counting pulses with a direction input
//! ```rust
//! use esp_pcnt::{
//!     channel::{self, CtrlMode, EdgeMode, Level, PcntInputConfig, PcntSource, Pull},
//!     config::Config,
//!     emulation::EmulatedPcnt,
//!     unit,
//!     Pcnt,
//! };
//!
//! let pcnt = Pcnt::new(EmulatedPcnt::new());
//!
//! let config = Config {
//!     channel: channel::Number::Channel0,
//!     // pulse input on GPIO4, direction control on GPIO5
//!     edge_signal: PcntSource::from_pin(4, PcntInputConfig { pull: Pull::Up }),
//!     ctrl_signal: PcntSource::from_pin(5, PcntInputConfig { pull: Pull::Up }),
//!     channel_config: channel::Config {
//!         lctrl_mode: CtrlMode::Reverse,
//!         hctrl_mode: CtrlMode::Keep,
//!         pos_edge: EdgeMode::Increment,
//!         neg_edge: EdgeMode::Hold,
//!         invert_ctrl: false,
//!         invert_sig: false,
//!     },
//!     high_limit: i16::MAX,
//!     low_limit: -10,
//!     threshold0: -1,
//!     threshold1: 1,
//!     filter: None,
//! };
//!
//! let mut counter = pcnt.counter(unit::Number::Unit0, &config).unwrap();
//! assert_eq!(counter.read(), Ok(0));
//!
//! pcnt.with_instance(|sim| {
//!     sim.pulse(4);
//!     sim.pulse(4);
//! });
//! assert_eq!(counter.read(), Ok(2));
//!
//! // GPIO5 low counts down
//! pcnt.with_instance(|sim| {
//!     sim.set_level(5, Level::Low);
//!     sim.pulse(4);
//! });
//! assert_eq!(counter.read(), Ok(1));
//!
//! counter.clear().unwrap();
//! assert_eq!(counter.read(), Ok(0));
//! ```
//!
//! ## Configuration
//! The capacity of the event queue is set at build time through the
//! `ESP_PCNT_CONFIG_EVENT_QUEUE_SIZE` environment variable (default 8).
//!
//! ## Feature Flags
#![doc = document_features::document_features!()]
#![doc(html_logo_url = "https://avatars.githubusercontent.com/u/46717278")]
#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

// MUST be the first module
mod fmt;

use core::{
    cell::{Cell, RefCell},
    fmt::Display,
};

use critical_section::Mutex;
use esp_config::*;

use self::{
    config::{Config, ConfigError},
    event::{EventNotification, EventQueue, OverflowPolicy},
    instance::Instance,
    unit::{Number, PulseCounter},
};

pub mod channel;
pub mod config;
pub mod emulation;
#[cfg(feature = "esp32")]
pub mod esp32;
pub mod event;
pub mod instance;
pub mod unit;

struct QueueConfig {
    event_queue_size: usize,
}

pub(crate) const CONFIG: QueueConfig = QueueConfig {
    event_queue_size: esp_config_int!(usize, "ESP_PCNT_CONFIG_EVENT_QUEUE_SIZE"),
};

/// The event queue of a [`Pcnt`], sized by `ESP_PCNT_CONFIG_EVENT_QUEUE_SIZE`.
pub type PcntEventQueue = EventQueue<{ CONFIG.event_queue_size }>;

/// Pulse counter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The configuration was rejected; nothing was applied.
    Config(ConfigError),
    /// The peripheral has no unit with this number.
    InvalidUnit,
    /// The unit is already controlled by another [`PulseCounter`].
    UnitInUse,
    /// The unit has not been initialized through this handle.
    NotInitialized,
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl core::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(err) => write!(f, "Invalid configuration: {err}"),
            Error::InvalidUnit => write!(f, "The peripheral has no such unit"),
            Error::UnitInUse => write!(f, "The unit is already in use"),
            Error::NotInitialized => write!(f, "The unit has not been initialized"),
        }
    }
}

/// A PCNT peripheral and the registry of its units.
pub struct Pcnt<I: Instance> {
    instance: Mutex<RefCell<I>>,
    claimed: Mutex<Cell<u8>>,
    events: PcntEventQueue,
}

impl<I: Instance> Pcnt<I> {
    /// Takes over a PCNT peripheral.
    ///
    /// Enables the peripheral and resets the configuration of every unit,
    /// which disables all channels, filters and events.
    pub fn new(instance: I) -> Self {
        Self::with_overflow_policy(instance, OverflowPolicy::default())
    }

    /// Like [`Pcnt::new`], choosing what happens when the event queue
    /// overflows.
    pub fn with_overflow_policy(mut instance: I, policy: OverflowPolicy) -> Self {
        instance.enable();
        for unit in Self::units() {
            instance.reset_config(unit);
        }
        debug!("PCNT enabled with {} units", I::UNIT_COUNT);

        Self {
            instance: Mutex::new(RefCell::new(instance)),
            claimed: Mutex::new(Cell::new(0)),
            events: EventQueue::new(policy),
        }
    }

    /// Claims a unit.
    ///
    /// The returned handle is [`Unconfigured`](unit::State::Unconfigured)
    /// until [`PulseCounter::initialize`] is called.
    pub fn unit(&self, number: Number) -> Result<PulseCounter<'_, I>, Error> {
        if number.index() >= I::UNIT_COUNT {
            return Err(Error::InvalidUnit);
        }

        critical_section::with(|cs| {
            let claimed = self.claimed.borrow(cs);
            let mask = 1 << number.index();
            if claimed.get() & mask != 0 {
                return Err(Error::UnitInUse);
            }
            claimed.set(claimed.get() | mask);
            Ok(())
        })?;

        Ok(PulseCounter::new(self, number))
    }

    /// Claims a unit, applies `config` and starts counting.
    pub fn counter(&self, number: Number, config: &Config) -> Result<PulseCounter<'_, I>, Error> {
        let mut counter = self.unit(number)?;
        counter.initialize(config)?;
        Ok(counter)
    }

    /// Services the PCNT interrupt.
    ///
    /// Call this from the interrupt handler bound to the PCNT interrupt. For
    /// every listening unit with a pending interrupt, the status is queued
    /// and the interrupt is acknowledged. Units are visited in ascending
    /// order.
    pub fn handle_interrupt(&self) {
        self.with_instance(|pcnt| {
            for unit in Self::units() {
                if !(pcnt.is_listening(unit) && pcnt.interrupt_is_set(unit)) {
                    continue;
                }

                let status = pcnt.status(unit);
                pcnt.reset_interrupt(unit);
                trace!("PCNT unit {:?} interrupt, status {}", unit, status);

                self.events.push(EventNotification { unit, status });
            }
        });
    }

    /// Takes the oldest event notification queued by
    /// [`handle_interrupt`](Self::handle_interrupt).
    pub fn poll_event(&self) -> Option<EventNotification> {
        self.events.pop()
    }

    /// Number of event notifications lost because the queue was full.
    pub fn dropped_events(&self) -> u32 {
        self.events.dropped()
    }

    /// The queue event notifications are delivered through.
    pub fn events(&self) -> &PcntEventQueue {
        &self.events
    }

    /// Runs `f` with exclusive access to the peripheral instance.
    ///
    /// With an [`EmulatedPcnt`](emulation::EmulatedPcnt) this is how input
    /// signals are driven.
    pub fn with_instance<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        critical_section::with(|cs| f(&mut self.instance.borrow_ref_mut(cs)))
    }

    pub(crate) fn release(&self, number: Number) {
        critical_section::with(|cs| {
            let claimed = self.claimed.borrow(cs);
            claimed.set(claimed.get() & !(1 << number.index()));
        });
    }

    fn units() -> impl Iterator<Item = Number> {
        Number::ALL.into_iter().take(I::UNIT_COUNT)
    }
}
