//! Board timebases: a 1 kHz millisecond tick and a free-running microsecond
//! counter.
//!
//! The state machines only ever subtract timestamps with wrapping
//! arithmetic, so both sources are allowed to wrap: the millisecond tick at
//! 2³² ms, the microsecond counter (32-bit TIM5 counting at 1 MHz) every
//! ~71 minutes.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use stm32f7xx_hal::pac;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Start the 1 kHz SysTick tick behind [`millis`].
pub fn start_millis(mut syst: SYST, sysclk_hz: u32) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(sysclk_hz / 1_000 - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

/// Milliseconds since [`start_millis`], wrapping at 2³².
#[inline]
pub fn millis() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

#[exception]
fn SysTick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Free-running microsecond counter on TIM5 (one of the two 32-bit timers).
pub struct MicrosTimer {
    tim: pac::TIM5,
}

impl MicrosTimer {
    /// Configure TIM5 to count at 1 MHz from the APB1 timer kernel clock.
    pub fn new(tim: pac::TIM5, timer_clock_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim5en().set_bit());

        tim.psc
            .write(|w| w.psc().bits((timer_clock_hz / 1_000_000 - 1) as u16));
        tim.arr.write(|w| unsafe { w.bits(u32::MAX) });
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Current counter value in µs, wrapping at 2³².
    #[inline]
    pub fn now_us(&self) -> u32 {
        self.tim.cnt.read().bits()
    }

    /// Busy-wait for `us` microseconds. Calibration only — everything else
    /// in the firmware is non-blocking.
    pub fn delay_us(&self, us: u32) {
        let start = self.now_us();
        while self.now_us().wrapping_sub(start) < us {}
    }
}
