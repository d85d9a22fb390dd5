//! # PCNT - emulated peripheral
//!
//! [`EmulatedPcnt`] models the ESP32 pulse counter together with the levels
//! of the GPIOs routed into it. Driving a pin with
//! [`set_level`](EmulatedPcnt::set_level) or [`pulse`](EmulatedPcnt::pulse)
//! produces edges, and every unit whose edge signal is routed from that pin
//! counts exactly as the hardware would:
//!
//! - the channel's edge and control modes decide the direction,
//! - a paused unit ignores edges,
//! - reaching an enabled limit latches the limit event and resets the count
//!   to 0; without the limit event the count wraps at the `i16` range,
//! - reaching an enabled threshold or zero latches that event, a threshold
//!   equal to a limit latches together with the limit event,
//! - every step that latches events replaces the previously latched set and
//!   raises the unit's raw interrupt bit.
//!
//! The zero mode only changes when the count reaches zero through counting,
//! so it reads [`ZeroMode::PosZero`] or [`ZeroMode::NegZero`]. The
//! [`ZeroMode::Positive`] and [`ZeroMode::Negative`] encodings are not
//! modelled. Glitch filtering is recorded but not modelled either, emulated
//! edges are ideal.

use enumset::EnumSet;

use crate::{
    channel::{self, EdgeMode, Level, PcntSource, Pull, Source},
    instance::Instance,
    unit::{self, Event, ZeroMode},
};

/// Number of GPIOs of the emulated chip.
pub const GPIO_COUNT: usize = 40;

const UNIT_COUNT: usize = 8;

#[derive(Clone, Copy, Debug)]
struct ChannelState {
    modes: channel::Config,
    edge_signal: PcntSource,
    ctrl_signal: PcntSource,
    invert_sig: bool,
    invert_ctrl: bool,
}

impl ChannelState {
    const RESET: Self = Self {
        modes: channel::Config::DISABLED,
        edge_signal: PcntSource::always_low(),
        ctrl_signal: PcntSource::always_low(),
        invert_sig: false,
        invert_ctrl: false,
    };
}

#[derive(Clone, Copy, Debug)]
struct UnitState {
    channels: [ChannelState; 2],
    low_limit: i16,
    high_limit: i16,
    threshold0: i16,
    threshold1: i16,
    filter: Option<u16>,
    events: EnumSet<Event>,
    paused: bool,
    count: i16,
    status: u32,
    interrupt_raw: bool,
    interrupt_enabled: bool,
}

impl UnitState {
    const RESET: Self = Self {
        channels: [ChannelState::RESET; 2],
        low_limit: 0,
        high_limit: 0,
        threshold0: 0,
        threshold1: 0,
        filter: None,
        events: EnumSet::empty(),
        paused: false,
        count: 0,
        status: 0,
        interrupt_raw: false,
        interrupt_enabled: false,
    };

    fn step(&mut self, action: EdgeMode) {
        let previous = self.count;
        let mut next = match action {
            EdgeMode::Hold => return,
            EdgeMode::Increment => previous.wrapping_add(1),
            EdgeMode::Decrement => previous.wrapping_sub(1),
        };

        let mut fired = EnumSet::<Event>::empty();
        let mut zero_mode = ZeroMode::from_status(self.status);

        // the threshold comparators see the value before a limit resets it
        if self.events.contains(Event::Threshold0) && next == self.threshold0 {
            fired |= Event::Threshold0;
        }
        if self.events.contains(Event::Threshold1) && next == self.threshold1 {
            fired |= Event::Threshold1;
        }

        if self.events.contains(Event::HighLimit) && next == self.high_limit {
            fired |= Event::HighLimit;
            next = 0;
        } else if self.events.contains(Event::LowLimit) && next == self.low_limit {
            fired |= Event::LowLimit;
            next = 0;
        } else if next == 0 {
            zero_mode = if previous > 0 {
                ZeroMode::PosZero
            } else {
                ZeroMode::NegZero
            };
            if self.events.contains(Event::Zero) {
                fired |= Event::Zero;
            }
        }

        self.count = next;
        if fired.is_empty() {
            self.status = (self.status & !0b11) | zero_mode.bits();
        } else {
            self.status = fired.as_repr() | zero_mode.bits();
            self.interrupt_raw = true;
        }
    }
}

/// Software model of the PCNT peripheral and its input GPIOs.
#[derive(Clone, Debug)]
pub struct EmulatedPcnt {
    enabled: bool,
    units: [UnitState; UNIT_COUNT],
    driven: [Option<Level>; GPIO_COUNT],
    pulls: [Pull; GPIO_COUNT],
}

impl Default for EmulatedPcnt {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedPcnt {
    /// A peripheral fresh out of reset with all pins undriven.
    pub const fn new() -> Self {
        Self {
            enabled: false,
            units: [UnitState::RESET; UNIT_COUNT],
            driven: [None; GPIO_COUNT],
            pulls: [Pull::None; GPIO_COUNT],
        }
    }

    /// The level of GPIO `pin`.
    ///
    /// An undriven pin follows its pull resistor; without one it reads low.
    pub fn level(&self, pin: u8) -> Level {
        let pin = pin as usize;
        match (self.driven.get(pin).copied().flatten(), self.pulls.get(pin)) {
            (Some(level), _) => level,
            (None, Some(Pull::Up)) => Level::High,
            (None, _) => Level::Low,
        }
    }

    /// Drives GPIO `pin` to `level`, counting the edge this produces.
    pub fn set_level(&mut self, pin: u8, level: Level) {
        if pin as usize >= GPIO_COUNT {
            return;
        }

        let before = self.level(pin);
        self.driven[pin as usize] = Some(level);
        if before != level {
            self.edge(pin, level);
        }
    }

    /// Stops driving GPIO `pin`, leaving it to its pull resistor.
    pub fn release(&mut self, pin: u8) {
        if (pin as usize) < GPIO_COUNT {
            let before = self.level(pin);
            self.driven[pin as usize] = None;
            let after = self.level(pin);
            if before != after {
                self.edge(pin, after);
            }
        }
    }

    /// Drives one full pulse on GPIO `pin`: a rising then a falling edge,
    /// ending low.
    pub fn pulse(&mut self, pin: u8) {
        self.set_level(pin, Level::Low);
        self.set_level(pin, Level::High);
        self.set_level(pin, Level::Low);
    }

    /// Drives `count` pulses on GPIO `pin`.
    pub fn pulses(&mut self, pin: u8, count: usize) {
        for _ in 0..count {
            self.pulse(pin);
        }
    }

    /// The glitch filter threshold currently applied to `unit`.
    pub fn filter(&self, unit: unit::Number) -> Option<u16> {
        self.units[unit.index()].filter
    }

    /// The events `unit` currently watches.
    pub fn watched_events(&self, unit: unit::Number) -> EnumSet<Event> {
        self.units[unit.index()].events
    }

    /// Returns `true` if `unit` is paused.
    pub fn is_paused(&self, unit: unit::Number) -> bool {
        self.units[unit.index()].paused
    }

    /// Returns `true` once [`Instance::enable`] has run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn source_level(&self, source: PcntSource, invert: bool) -> Level {
        let level = match source.source() {
            Source::Pin { number, .. } => self.level(number),
            Source::High => Level::High,
            Source::Low => Level::Low,
        };
        if invert {
            level.inverted()
        } else {
            level
        }
    }

    fn edge(&mut self, pin: u8, level: Level) {
        for index in 0..UNIT_COUNT {
            if self.units[index].paused {
                continue;
            }

            for channel in 0..2 {
                let state = self.units[index].channels[channel];
                if state.edge_signal.pin() != Some(pin) {
                    continue;
                }

                let rising = if state.invert_sig {
                    level.inverted().is_high()
                } else {
                    level.is_high()
                };
                let ctrl_high = self
                    .source_level(state.ctrl_signal, state.invert_ctrl)
                    .is_high();

                let action = state.modes.action(rising, ctrl_high);
                self.units[index].step(action);
            }
        }
    }

    fn route(&mut self, source: PcntSource) {
        if let (Some(pin), Some(config)) = (source.pin(), source.input_config()) {
            if let Some(pull) = self.pulls.get_mut(pin as usize) {
                *pull = config.pull;
            }
        }
    }

    fn unit_mut(&mut self, unit: unit::Number) -> &mut UnitState {
        &mut self.units[unit.index()]
    }
}

impl Instance for EmulatedPcnt {
    const UNIT_COUNT: usize = UNIT_COUNT;

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn is_input_pin(&self, pin: u8) -> bool {
        // GPIO6..=11 are taken by the SPI flash and GPIO20, 24, 28..=31 are
        // not bonded out.
        matches!(pin, 0..=5 | 12..=19 | 21..=23 | 25..=27 | 32..=39)
    }

    fn reset_config(&mut self, unit: unit::Number) {
        let state = self.unit_mut(unit);
        state.filter = None;
        state.events = EnumSet::empty();
        for ch in state.channels.iter_mut() {
            ch.modes = channel::Config::DISABLED;
        }
    }

    fn set_channel_modes(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        config: &channel::Config,
    ) {
        self.unit_mut(unit).channels[channel as usize].modes = *config;
    }

    fn set_edge_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    ) {
        self.route(source);
        let state = &mut self.unit_mut(unit).channels[channel as usize];
        state.edge_signal = source;
        state.invert_sig = invert;
    }

    fn set_ctrl_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    ) {
        self.route(source);
        let state = &mut self.unit_mut(unit).channels[channel as usize];
        state.ctrl_signal = source;
        state.invert_ctrl = invert;
    }

    fn set_limits(&mut self, unit: unit::Number, low: i16, high: i16) {
        let state = self.unit_mut(unit);
        state.low_limit = low;
        state.high_limit = high;
    }

    fn set_thresholds(&mut self, unit: unit::Number, threshold0: i16, threshold1: i16) {
        let state = self.unit_mut(unit);
        state.threshold0 = threshold0;
        state.threshold1 = threshold1;
    }

    fn set_filter(&mut self, unit: unit::Number, threshold: Option<u16>) {
        self.unit_mut(unit).filter = threshold;
    }

    fn set_events(&mut self, unit: unit::Number, events: EnumSet<Event>) {
        self.unit_mut(unit).events = events;
    }

    fn pause(&mut self, unit: unit::Number) {
        self.unit_mut(unit).paused = true;
    }

    fn resume(&mut self, unit: unit::Number) {
        self.unit_mut(unit).paused = false;
    }

    fn clear(&mut self, unit: unit::Number) {
        self.unit_mut(unit).count = 0;
    }

    fn counter(&self, unit: unit::Number) -> i16 {
        self.units[unit.index()].count
    }

    fn status(&self, unit: unit::Number) -> u32 {
        self.units[unit.index()].status
    }

    fn set_listening(&mut self, unit: unit::Number, enable: bool) {
        self.unit_mut(unit).interrupt_enabled = enable;
    }

    fn is_listening(&self, unit: unit::Number) -> bool {
        self.units[unit.index()].interrupt_enabled
    }

    fn interrupt_is_set(&self, unit: unit::Number) -> bool {
        self.units[unit.index()].interrupt_raw
    }

    fn reset_interrupt(&mut self, unit: unit::Number) {
        self.unit_mut(unit).interrupt_raw = false;
    }
}
