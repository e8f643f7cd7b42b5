//! Pedal pressure sensor on ADC1, using direct PAC register access.
//!
//! Blocking single-channel reads are all the homing routine needs; one
//! conversion at the slowest sample time is a few µs against a 5 ms step
//! period.

use stm32f7xx_hal::pac;

/// The analog pressure pad under the pedal hard stop.
pub struct PressureSensor {
    adc: pac::ADC1,
    channel: u8,
}

impl PressureSensor {
    /// Enable and configure ADC1 for software-triggered single conversions
    /// of `channel`. The matching pin must already be in analog mode.
    pub fn new(adc: pac::ADC1, channel: u8) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        // ADC prescaler: PCLK2 / 4
        common.ccr.modify(|_, w| w.adcpre().div4());

        // Power off to configure
        adc.cr2.modify(|_, w| w.adon().clear_bit());

        // 12-bit, right-aligned, software trigger
        adc.cr1.modify(|_, w| w.res().bits(0b00));
        adc.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });

        // Longest sample time on the selected channel for a stable reading
        // from the high-impedance pressure divider.
        if channel <= 9 {
            adc.smpr2.modify(|_, w| match channel {
                0 => w.smp0().bits(0b111),
                1 => w.smp1().bits(0b111),
                2 => w.smp2().bits(0b111),
                3 => w.smp3().bits(0b111),
                4 => w.smp4().bits(0b111),
                5 => w.smp5().bits(0b111),
                6 => w.smp6().bits(0b111),
                7 => w.smp7().bits(0b111),
                8 => w.smp8().bits(0b111),
                9 => w.smp9().bits(0b111),
                _ => unreachable!(),
            });
        }

        // Sequence length = 1 conversion
        adc.sqr1.modify(|_, w| w.l().bits(0));

        // Power on
        adc.cr2.modify(|_, w| w.adon().set_bit());

        Self { adc, channel }
    }

    /// One blocking conversion; raw 12-bit result (0..=4095).
    pub fn read(&self) -> u16 {
        self.adc
            .sqr3
            .modify(|_, w| unsafe { w.sq1().bits(self.channel & 0x1F) });

        self.adc.cr2.modify(|_, w| w.swstart().set_bit());
        while self.adc.sr.read().eoc().bit_is_clear() {}

        self.adc.dr.read().data().bits()
    }
}
