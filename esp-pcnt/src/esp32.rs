//! # PCNT - ESP32 registers
//!
//! [`Esp32Pcnt`] drives the pulse counter of the ESP32 through the `esp32`
//! peripheral access crate: the PCNT block itself, the GPIO matrix for signal
//! routing, the IO MUX for pad configuration and DPORT for the peripheral
//! clock.
//!
//! Bind the `PCNT` interrupt to a handler that calls
//! [`Pcnt::handle_interrupt`](crate::Pcnt::handle_interrupt).

use core::{cell::Cell, mem::transmute};

use ::esp32::{io_mux, DPORT, GPIO, IO_MUX, PCNT};
use critical_section::Mutex;
use enumset::EnumSet;

use crate::{
    channel::{self, PcntSource, Pull, Source},
    instance::Instance,
    unit::{self, Event},
};

/// GPIO matrix input selecting a constant high level.
const ONE_INPUT: u8 = 0x38;
/// GPIO matrix input selecting a constant low level.
const ZERO_INPUT: u8 = 0x30;

/// IO MUX function 2 routes the pad through the GPIO matrix.
const GPIO_FUNCTION: u8 = 2;

static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

fn pcnt() -> &'static ::esp32::pcnt::RegisterBlock {
    unsafe { &*PCNT::ptr() }
}

/// GPIO matrix input signal carrying the edge signal of a unit's channel.
///
/// Units 0 to 4 occupy signals 39..=58, units 5 to 7 signals 71..=82.
fn sig_in(unit: unit::Number, channel: channel::Number) -> usize {
    let base = match unit.index() {
        n @ 0..=4 => 39 + 4 * n,
        n => 71 + 4 * (n - 5),
    };
    base + channel as usize
}

/// GPIO matrix input signal carrying the control signal of a unit's channel.
fn ctrl_in(unit: unit::Number, channel: channel::Number) -> usize {
    sig_in(unit, channel) + 2
}

/// GPIOs that can be routed into the PCNT.
///
/// GPIO6..=11 are taken by the SPI flash and GPIO20, 24, 28..=31 are not
/// bonded out.
fn is_input_pin(pin: u8) -> bool {
    matches!(pin, 0..=5 | 12..=19 | 21..=23 | 25..=27 | 32..=39)
}

/// The IO MUX pad register of an input-capable GPIO.
fn io_mux_reg(pin: u8) -> Option<&'static io_mux::GPIO0> {
    let iomux = unsafe { &*IO_MUX::ptr() };

    // Every pad register has the layout of GPIO0.
    let reg = unsafe {
        match pin {
            0 => transmute::<&io_mux::GPIO0, &io_mux::GPIO0>(iomux.gpio0()),
            1 => transmute::<&io_mux::GPIO1, &io_mux::GPIO0>(iomux.gpio1()),
            2 => transmute::<&io_mux::GPIO2, &io_mux::GPIO0>(iomux.gpio2()),
            3 => transmute::<&io_mux::GPIO3, &io_mux::GPIO0>(iomux.gpio3()),
            4 => transmute::<&io_mux::GPIO4, &io_mux::GPIO0>(iomux.gpio4()),
            5 => transmute::<&io_mux::GPIO5, &io_mux::GPIO0>(iomux.gpio5()),
            12 => transmute::<&io_mux::GPIO12, &io_mux::GPIO0>(iomux.gpio12()),
            13 => transmute::<&io_mux::GPIO13, &io_mux::GPIO0>(iomux.gpio13()),
            14 => transmute::<&io_mux::GPIO14, &io_mux::GPIO0>(iomux.gpio14()),
            15 => transmute::<&io_mux::GPIO15, &io_mux::GPIO0>(iomux.gpio15()),
            16 => transmute::<&io_mux::GPIO16, &io_mux::GPIO0>(iomux.gpio16()),
            17 => transmute::<&io_mux::GPIO17, &io_mux::GPIO0>(iomux.gpio17()),
            18 => transmute::<&io_mux::GPIO18, &io_mux::GPIO0>(iomux.gpio18()),
            19 => transmute::<&io_mux::GPIO19, &io_mux::GPIO0>(iomux.gpio19()),
            21 => transmute::<&io_mux::GPIO21, &io_mux::GPIO0>(iomux.gpio21()),
            22 => transmute::<&io_mux::GPIO22, &io_mux::GPIO0>(iomux.gpio22()),
            23 => transmute::<&io_mux::GPIO23, &io_mux::GPIO0>(iomux.gpio23()),
            25 => transmute::<&io_mux::GPIO25, &io_mux::GPIO0>(iomux.gpio25()),
            26 => transmute::<&io_mux::GPIO26, &io_mux::GPIO0>(iomux.gpio26()),
            27 => transmute::<&io_mux::GPIO27, &io_mux::GPIO0>(iomux.gpio27()),
            32 => transmute::<&io_mux::GPIO32, &io_mux::GPIO0>(iomux.gpio32()),
            33 => transmute::<&io_mux::GPIO33, &io_mux::GPIO0>(iomux.gpio33()),
            34 => transmute::<&io_mux::GPIO34, &io_mux::GPIO0>(iomux.gpio34()),
            35 => transmute::<&io_mux::GPIO35, &io_mux::GPIO0>(iomux.gpio35()),
            36 => transmute::<&io_mux::GPIO36, &io_mux::GPIO0>(iomux.gpio36()),
            37 => transmute::<&io_mux::GPIO37, &io_mux::GPIO0>(iomux.gpio37()),
            38 => transmute::<&io_mux::GPIO38, &io_mux::GPIO0>(iomux.gpio38()),
            39 => transmute::<&io_mux::GPIO39, &io_mux::GPIO0>(iomux.gpio39()),
            _ => return None,
        }
    };
    Some(reg)
}

/// The PCNT peripheral of the ESP32.
#[derive(Debug)]
#[non_exhaustive]
pub struct Esp32Pcnt {}

impl Esp32Pcnt {
    /// Takes the peripheral. Returns `None` if it was already taken.
    pub fn take() -> Option<Self> {
        critical_section::with(|cs| {
            let taken = TAKEN.borrow(cs);
            if taken.get() {
                None
            } else {
                taken.set(true);
                Some(Self {})
            }
        })
    }

    /// Unsafely creates an instance of the peripheral.
    ///
    /// # Safety
    ///
    /// No other code may access the PCNT registers, or the GPIO matrix
    /// inputs of the PCNT signals, while the returned value is alive.
    pub unsafe fn steal() -> Self {
        Self {}
    }

    fn route(&mut self, signal: usize, source: PcntSource, invert: bool) {
        let input = match source.source() {
            Source::Pin { number, config } => {
                configure_input_pad(number, config.pull);
                number
            }
            Source::High => ONE_INPUT,
            Source::Low => ZERO_INPUT,
        };

        unsafe { &*GPIO::ptr() }
            .func_in_sel_cfg(signal)
            .modify(|_, w| unsafe {
                w.sel().set_bit();
                w.in_inv_sel().bit(invert);
                w.in_sel().bits(input)
            });
    }
}

fn configure_input_pad(pin: u8, pull: Pull) {
    let Some(pad) = io_mux_reg(pin) else {
        return;
    };

    // disable the output driver
    let gpio = unsafe { &*GPIO::ptr() };
    if pin < 32 {
        gpio.enable_w1tc().write(|w| unsafe { w.bits(1 << pin) });
    } else {
        gpio.enable1_w1tc().write(|w| unsafe { w.bits(1 << (pin - 32)) });
    }

    pad.modify(|_, w| unsafe {
        w.mcu_sel().bits(GPIO_FUNCTION);
        w.fun_ie().set_bit();
        w.fun_wpd().bit(pull == Pull::Down);
        w.fun_wpu().bit(pull == Pull::Up)
    });
}

impl Instance for Esp32Pcnt {
    const UNIT_COUNT: usize = 8;

    fn enable(&mut self) {
        let dport = unsafe { &*DPORT::ptr() };
        dport.perip_rst_en().modify(|_, w| w.pcnt_rst().set_bit());
        dport.perip_rst_en().modify(|_, w| w.pcnt_rst().clear_bit());
        dport.perip_clk_en().modify(|_, w| w.pcnt_clk_en().set_bit());

        // Remove reset bit from units.
        pcnt().ctrl().modify(|_, w| {
            for unit in unit::Number::ALL {
                w.cnt_rst_u(unit.index() as u8).clear_bit();
            }
            w.clk_en().set_bit()
        });
    }

    fn is_input_pin(&self, pin: u8) -> bool {
        is_input_pin(pin)
    }

    fn reset_config(&mut self, unit: unit::Number) {
        pcnt().unit(unit.index()).conf0().write(|w| unsafe {
            // All bits are accounted for in the TRM.
            w.bits(0)
        });
    }

    fn set_channel_modes(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        config: &channel::Config,
    ) {
        let ch = channel as u8;
        pcnt().unit(unit.index()).conf0().modify(|_, w| unsafe {
            w.ch_hctrl_mode(ch).bits(config.hctrl_mode as u8);
            w.ch_lctrl_mode(ch).bits(config.lctrl_mode as u8);
            w.ch_neg_mode(ch).bits(config.neg_edge as u8);
            w.ch_pos_mode(ch).bits(config.pos_edge as u8)
        });
    }

    fn set_edge_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    ) {
        self.route(sig_in(unit, channel), source, invert);
    }

    fn set_ctrl_signal(
        &mut self,
        unit: unit::Number,
        channel: channel::Number,
        source: PcntSource,
        invert: bool,
    ) {
        self.route(ctrl_in(unit, channel), source, invert);
    }

    fn set_limits(&mut self, unit: unit::Number, low: i16, high: i16) {
        pcnt().unit(unit.index()).conf2().write(|w| unsafe {
            w.cnt_l_lim().bits(low as u16);
            w.cnt_h_lim().bits(high as u16)
        });
    }

    fn set_thresholds(&mut self, unit: unit::Number, threshold0: i16, threshold1: i16) {
        pcnt().unit(unit.index()).conf1().write(|w| unsafe {
            w.cnt_thres0().bits(threshold0 as u16);
            w.cnt_thres1().bits(threshold1 as u16)
        });
    }

    fn set_filter(&mut self, unit: unit::Number, threshold: Option<u16>) {
        let conf0 = pcnt().unit(unit.index()).conf0();
        match threshold {
            None => {
                conf0.modify(|_, w| w.filter_en().clear_bit());
            }
            Some(threshold) => {
                conf0.modify(|_, w| unsafe {
                    w.filter_thres().bits(threshold).filter_en().set_bit()
                });
            }
        }
    }

    fn set_events(&mut self, unit: unit::Number, events: EnumSet<Event>) {
        pcnt().unit(unit.index()).conf0().modify(|_, w| {
            w.thr_zero_en().bit(events.contains(Event::Zero));
            w.thr_h_lim_en().bit(events.contains(Event::HighLimit));
            w.thr_l_lim_en().bit(events.contains(Event::LowLimit));
            w.thr_thres0_en().bit(events.contains(Event::Threshold0));
            w.thr_thres1_en().bit(events.contains(Event::Threshold1))
        });
    }

    fn pause(&mut self, unit: unit::Number) {
        pcnt()
            .ctrl()
            .modify(|_, w| w.cnt_pause_u(unit.index() as u8).set_bit());
    }

    fn resume(&mut self, unit: unit::Number) {
        pcnt()
            .ctrl()
            .modify(|_, w| w.cnt_pause_u(unit.index() as u8).clear_bit());
    }

    fn clear(&mut self, unit: unit::Number) {
        let n = unit.index() as u8;
        pcnt().ctrl().modify(|_, w| w.cnt_rst_u(n).set_bit());
        pcnt().ctrl().modify(|_, w| w.cnt_rst_u(n).clear_bit());
    }

    fn counter(&self, unit: unit::Number) -> i16 {
        pcnt().u_cnt(unit.index()).read().cnt().bits() as i16
    }

    fn status(&self, unit: unit::Number) -> u32 {
        pcnt().u_status(unit.index()).read().bits()
    }

    fn set_listening(&mut self, unit: unit::Number, enable: bool) {
        pcnt()
            .int_ena()
            .modify(|_, w| w.cnt_thr_event_u(unit.index() as u8).bit(enable));
    }

    fn is_listening(&self, unit: unit::Number) -> bool {
        pcnt()
            .int_ena()
            .read()
            .cnt_thr_event_u(unit.index() as u8)
            .bit()
    }

    fn interrupt_is_set(&self, unit: unit::Number) -> bool {
        pcnt()
            .int_raw()
            .read()
            .cnt_thr_event_u(unit.index() as u8)
            .bit()
    }

    fn reset_interrupt(&mut self, unit: unit::Number) {
        pcnt()
            .int_clr()
            .write(|w| w.cnt_thr_event_u(unit.index() as u8).set_bit());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_indices_follow_gpio_matrix() {
        use channel::Number::{Channel0, Channel1};

        assert_eq!(sig_in(unit::Number::Unit0, Channel0), 39);
        assert_eq!(sig_in(unit::Number::Unit0, Channel1), 40);
        assert_eq!(ctrl_in(unit::Number::Unit0, Channel0), 41);
        assert_eq!(ctrl_in(unit::Number::Unit0, Channel1), 42);

        assert_eq!(sig_in(unit::Number::Unit3, Channel0), 51);
        assert_eq!(ctrl_in(unit::Number::Unit4, Channel1), 58);

        // units 5..=7 continue after the gap at 59..=70
        assert_eq!(sig_in(unit::Number::Unit5, Channel0), 71);
        assert_eq!(ctrl_in(unit::Number::Unit6, Channel0), 77);
        assert_eq!(sig_in(unit::Number::Unit7, Channel1), 80);
        assert_eq!(ctrl_in(unit::Number::Unit7, Channel1), 82);
    }

    #[test]
    fn every_input_pin_has_a_pad() {
        for pin in 0..=u8::MAX {
            assert_eq!(is_input_pin(pin), io_mux_reg(pin).is_some(), "GPIO{pin}");
        }
    }

    #[test]
    fn mode_discriminants_match_register_encoding() {
        use channel::{CtrlMode, EdgeMode};

        assert_eq!(EdgeMode::Hold as u8, 0);
        assert_eq!(EdgeMode::Increment as u8, 1);
        assert_eq!(EdgeMode::Decrement as u8, 2);
        assert_eq!(CtrlMode::Keep as u8, 0);
        assert_eq!(CtrlMode::Reverse as u8, 1);
        assert_eq!(CtrlMode::Disable as u8, 2);
    }
}
