//! # PCNT - peripheral instance
//!
//! [`Instance`] is the register-level seam of the driver. Every method maps
//! to a handful of register accesses on the real peripheral; the driver in
//! [`crate::unit`] sequences them. The crate ships the real ESP32 registers
//! (`esp32` feature) and [`EmulatedPcnt`](crate::emulation::EmulatedPcnt).
//!
//! Methods are called with the owning [`Pcnt`](crate::Pcnt) locked, so an
//! implementation never sees two sequences interleave.

use enumset::EnumSet;

use crate::{
    channel::{self, PcntSource},
    unit::{self, Event},
};

/// A PCNT peripheral: its units, their channels and their signal routing.
pub trait Instance {
    /// Number of counter units the peripheral provides.
    const UNIT_COUNT: usize;

    /// Enables the peripheral clock and releases every unit from reset.
    fn enable(&mut self);

    /// Returns `true` if `pin` is a GPIO that can be routed to a unit.
    fn is_input_pin(&self, pin: u8) -> bool;

    /// Resets a unit's configuration: disables the filter, every watched
    /// event and the modes of both channels.
    fn reset_config(&mut self, unit: unit::Number);

    /// Writes the edge and control modes of a channel.
    fn set_channel_modes(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        config: &channel::Config,
    );

    /// Routes the edge signal of a channel.
    fn set_edge_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    );

    /// Routes the control signal of a channel.
    fn set_ctrl_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    );

    /// Writes the low and high limit values.
    fn set_limits(&mut self, unit: unit::Number, low: i16, high: i16);

    /// Writes the threshold 0 and threshold 1 values.
    fn set_thresholds(&mut self, unit: unit::Number, threshold0: i16, threshold1: i16);

    /// Enables the glitch filter with `threshold` APB cycles, or disables it.
    fn set_filter(&mut self, unit: unit::Number, threshold: Option<u16>);

    /// Selects the events the unit watches. Events not in `events` are
    /// disabled.
    fn set_events(&mut self, unit: unit::Number, events: EnumSet<Event>);

    /// Stops counting without touching the count.
    fn pause(&mut self, unit: unit::Number);

    /// Continues counting.
    fn resume(&mut self, unit: unit::Number);

    /// Resets the count to zero.
    fn clear(&mut self, unit: unit::Number);

    /// Reads the count.
    fn counter(&self, unit: unit::Number) -> i16;

    /// Reads the raw status word: event bits and the zero mode.
    fn status(&self, unit: unit::Number) -> u32;

    /// Enables or disables the unit's interrupt.
    fn set_listening(&mut self, unit: unit::Number, enable: bool);

    /// Returns `true` if the unit's interrupt is enabled.
    fn is_listening(&self, unit: unit::Number) -> bool;

    /// Returns `true` if the unit's raw interrupt bit is set.
    fn interrupt_is_set(&self, unit: unit::Number) -> bool;

    /// Clears the unit's raw interrupt bit.
    fn reset_interrupt(&mut self, unit: unit::Number);
}
