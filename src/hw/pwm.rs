// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 12-channel solenoid PWM bank on TIM2/TIM3/TIM4 using direct PAC register
//! access.
//!
//! Channel map (board wiring):
//!
//! | Channels | Timer | Pins |
//! | -------- | ----- | ---- |
//! | 0–3  | TIM2 CH1–4 | PA0–PA3 (AF1) |
//! | 4–7  | TIM3 CH1–4 | PA6, PA7, PB0, PB1 (AF2) |
//! | 8–11 | TIM4 CH1–4 | PB6–PB9 (AF2) |
//!
//! All three timers run at the same 20 kHz carrier; a duty update only
//! rewrites one compare register, so channels never disturb each other and
//! the update is glitch-free at any call rate.

use stm32f7xx_hal::pac;

use crate::drivers::key_solenoid::{PwmOutput, MAX_DUTY_CYCLE, NUM_KEYS};

/// PWM carrier frequency for the solenoid drivers.
pub const PWM_FREQUENCY_HZ: u32 = 20_000;

macro_rules! init_pwm_timer {
    ($tim:expr, $period:expr) => {{
        $tim.psc.write(|w| w.psc().bits(0));
        $tim.arr.write(|w| unsafe { w.bits($period) });

        // PWM mode 1 with preload on all four channels.
        $tim.ccmr1_output().modify(|_, w| unsafe {
            w.oc1m().bits(0b110);
            w.oc1pe().set_bit();
            w.oc2m().bits(0b110);
            w.oc2pe().set_bit()
        });
        $tim.ccmr2_output().modify(|_, w| unsafe {
            w.oc3m().bits(0b110);
            w.oc3pe().set_bit();
            w.oc4m().bits(0b110);
            w.oc4pe().set_bit()
        });
        $tim.ccer.modify(|_, w| {
            w.cc1e().set_bit();
            w.cc2e().set_bit();
            w.cc3e().set_bit();
            w.cc4e().set_bit()
        });

        // Start from 0% everywhere.
        $tim.ccr1.write(|w| unsafe { w.bits(0) });
        $tim.ccr2.write(|w| unsafe { w.bits(0) });
        $tim.ccr3.write(|w| unsafe { w.bits(0) });
        $tim.ccr4.write(|w| unsafe { w.bits(0) });

        $tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());
        $tim.egr.write(|w| w.ug().set_bit());
    }};
}

/// The PWM output service: TIM2/TIM3/TIM4, four compare channels each.
pub struct PwmBank {
    tim2: pac::TIM2,
    tim3: pac::TIM3,
    tim4: pac::TIM4,
    period: u32,
}

impl PwmBank {
    /// Take ownership of the three timers and configure them for 20 kHz PWM.
    ///
    /// `timer_clock_hz` is the APB1 timer kernel clock. The matching GPIO
    /// pins must be muxed to their timer alternate functions by the caller.
    pub fn new(tim2: pac::TIM2, tim3: pac::TIM3, tim4: pac::TIM4, timer_clock_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr
            .modify(|_, w| w.tim2en().set_bit().tim3en().set_bit().tim4en().set_bit());

        let period = (timer_clock_hz / PWM_FREQUENCY_HZ).saturating_sub(1);

        init_pwm_timer!(tim2, period);
        init_pwm_timer!(tim3, period);
        init_pwm_timer!(tim4, period);

        Self {
            tim2,
            tim3,
            tim4,
            period,
        }
    }
}

impl PwmOutput for PwmBank {
    fn set_duty_cycle(&mut self, channel: usize, percent: u8) {
        if channel >= NUM_KEYS {
            return;
        }
        let percent = percent.min(MAX_DUTY_CYCLE) as u32;
        let compare = percent * (self.period + 1) / MAX_DUTY_CYCLE as u32;

        match channel {
            0 => self.tim2.ccr1.write(|w| unsafe { w.bits(compare) }),
            1 => self.tim2.ccr2.write(|w| unsafe { w.bits(compare) }),
            2 => self.tim2.ccr3.write(|w| unsafe { w.bits(compare) }),
            3 => self.tim2.ccr4.write(|w| unsafe { w.bits(compare) }),
            4 => self.tim3.ccr1.write(|w| unsafe { w.bits(compare) }),
            5 => self.tim3.ccr2.write(|w| unsafe { w.bits(compare) }),
            6 => self.tim3.ccr3.write(|w| unsafe { w.bits(compare) }),
            7 => self.tim3.ccr4.write(|w| unsafe { w.bits(compare) }),
            8 => self.tim4.ccr1.write(|w| unsafe { w.bits(compare) }),
            9 => self.tim4.ccr2.write(|w| unsafe { w.bits(compare) }),
            10 => self.tim4.ccr3.write(|w| unsafe { w.bits(compare) }),
            11 => self.tim4.ccr4.write(|w| unsafe { w.bits(compare) }),
            _ => unreachable!(),
        }
    }
}
