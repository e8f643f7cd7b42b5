//! Board status LED with a pulse-stretched activity blink.
//!
//! Serial bytes arrive far faster than the eye can follow, so rather than
//! toggling per byte the LED is latched on by [`StatusLed::pulse`] and turned
//! off by [`StatusLed::update`] once the stretch interval has passed.

use embedded_hal::digital::OutputPin;

/// How long one activity pulse keeps the LED lit.
const ACTIVITY_PULSE_MS: u32 = 50;

pub struct StatusLed<PIN: OutputPin> {
    pin: PIN,
    active_low: bool,
    lit: bool,
    lit_since_ms: u32,
}

impl<PIN: OutputPin> StatusLed<PIN> {
    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, false)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, true)
    }

    fn new(pin: PIN, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            active_low,
            lit: false,
            lit_since_ms: 0,
        };
        led.drive(false);
        led
    }

    /// Light the LED and restart the stretch interval. Call on link activity.
    pub fn pulse(&mut self, now_ms: u32) {
        self.drive(true);
        self.lit = true;
        self.lit_since_ms = now_ms;
    }

    /// Turn the LED back off once its pulse has been visible long enough.
    pub fn update(&mut self, now_ms: u32) {
        if self.lit && now_ms.wrapping_sub(self.lit_since_ms) >= ACTIVITY_PULSE_MS {
            self.drive(false);
            self.lit = false;
        }
    }

    fn drive(&mut self, on: bool) {
        if on != self.active_low {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }
}
