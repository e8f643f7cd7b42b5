#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use keybed::control::board::DriverBoard;
use keybed::hw::time::{self, MicrosTimer};
use keybed::hw::{PressureSensor, PwmBank, StatusLed, Usart};
use keybed::protocol::line::LineAssembler;

/// ADC channel wired to the pedal pressure pad (PA4).
const PRESSURE_ADC_CHANNEL: u8 = 4;
/// How often the link statistics go out on the debug terminal.
const STATS_REPORT_INTERVAL_MS: u32 = 10_000;

#[entry]
fn main() -> ! {
    // Peripherals. A failure here means unconfigured hardware; panic-halt
    // parks the MCU rather than risk driving the coils uninitialized.
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let sysclk_hz = clocks.sysclk().raw();
    // APB1 is undivided at this clock configuration, so the timer kernel
    // clock equals PCLK1.
    let timer_clock_hz = clocks.pclk1().raw();

    // GPIO
    let gpioa = dp.GPIOA.split();
    let gpiob = dp.GPIOB.split();
    let gpioc = dp.GPIOC.split();
    let gpiod = dp.GPIOD.split();

    // Solenoid PWM pins: TIM2 CH1-4, TIM3 CH1-4, TIM4 CH1-4.
    let _ = gpioa.pa0.into_alternate::<1>();
    let _ = gpioa.pa1.into_alternate::<1>();
    let _ = gpioa.pa2.into_alternate::<1>();
    let _ = gpioa.pa3.into_alternate::<1>();
    let _ = gpioa.pa6.into_alternate::<2>();
    let _ = gpioa.pa7.into_alternate::<2>();
    let _ = gpiob.pb0.into_alternate::<2>();
    let _ = gpiob.pb1.into_alternate::<2>();
    let _ = gpiob.pb6.into_alternate::<2>();
    let _ = gpiob.pb7.into_alternate::<2>();
    let _ = gpiob.pb8.into_alternate::<2>();
    let _ = gpiob.pb9.into_alternate::<2>();
    let pwm = PwmBank::new(dp.TIM2, dp.TIM3, dp.TIM4, timer_clock_hz);

    // Timebases
    time::start_millis(cp.SYST, sysclk_hz);
    let micros = MicrosTimer::new(dp.TIM5, timer_clock_hz);

    // USART1: RS-485 command link + debug terminal
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    let mut usart = Usart::new(serial);

    // Pedal stepper (step/dir) and pressure sensor
    let step_pin = gpioc.pc14.into_push_pull_output();
    let dir_pin = gpioc.pc15.into_push_pull_output();
    let _pressure_pin = gpioa.pa4.into_analog();
    let sensor = PressureSensor::new(dp.ADC1, PRESSURE_ADC_CHANNEL);

    // Activity LED
    let mut led = StatusLed::active_low(gpiod.pd10.into_push_pull_output());

    let mut board = DriverBoard::new(pwm, step_pin, dir_pin);
    let mut line = LineAssembler::new();

    usart.println("keybed: homing pedal");
    board
        .pedal_mut()
        .calibrate(|| sensor.read(), |us| micros.delay_us(us));
    usart.println("keybed: ready");

    let mut last_report_ms = time::millis();
    loop {
        // Receive path: at most one byte per iteration, queued for the poll
        // below. Malformed lines get an error line back as the side channel.
        if let Some(byte) = usart.read_byte() {
            let mut rejected = None;
            line.push(byte, |l| {
                if let Err(error) = board.on_line(l) {
                    rejected = Some(error);
                }
            });
            if rejected.is_some() {
                usart.write_str("E:parse\r\n");
            }
            led.pulse(time::millis());
        }

        let now_ms = time::millis();
        board.poll(now_ms, micros.now_us());
        led.update(now_ms);

        // Periodic link report on the debug terminal.
        if now_ms.wrapping_sub(last_report_ms) >= STATS_REPORT_INTERVAL_MS {
            last_report_ms = now_ms;
            let stats = board.stats();
            usart.write_str("stats: lines=");
            usart.print_u32(stats.lines_received);
            usart.write_str(" executed=");
            usart.print_u32(stats.commands_executed);
            usart.write_str(" parse_err=");
            usart.print_u32(stats.parse_errors);
            usart.write_str(" dropped=");
            usart.print_u32(stats.queue_overflows);
            usart.write_str("\r\n");
        }
    }
}
