//! Driver-board composition: one owned context wiring the serial protocol to
//! the actuators.
//!
//! Each board has exactly one of everything, so a single long-lived
//! [`DriverBoard`] owns the key driver, the pedal controller, and the command
//! queue — no process-wide statics. The receive path feeds [`on_line`], the
//! main loop calls [`poll`] at its fixed cadence.
//!
//! [`on_line`]: DriverBoard::on_line
//! [`poll`]: DriverBoard::poll

use embedded_hal::digital::OutputPin;

use crate::control::pedal::{PedalCommand, PedalController};
use crate::drivers::key_solenoid::{KeyDriver, PwmOutput};
use crate::drivers::stepper::StepperMotor;
use crate::protocol::commands::{Command, ParseError};
use crate::protocol::parser;
use crate::protocol::queue::CommandQueue;

/// Running totals for the serial link. Protocol errors are silent on the
/// wire protocol itself; these counters plus the debug terminal are the
/// observable record of drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub lines_received: u32,
    pub parse_errors: u32,
    pub queue_overflows: u32,
    pub commands_executed: u32,
}

/// The board context: protocol front end plus both actuator subsystems.
pub struct DriverBoard<P: PwmOutput, STEP: OutputPin, DIR: OutputPin> {
    keys: KeyDriver<P>,
    pedal: PedalController<STEP, DIR>,
    queue: CommandQueue,
    stats: LinkStats,
}

impl<P: PwmOutput, STEP: OutputPin, DIR: OutputPin> DriverBoard<P, STEP, DIR> {
    pub fn new(pwm: P, step_pin: STEP, dir_pin: DIR) -> Self {
        Self {
            keys: KeyDriver::new(pwm),
            pedal: PedalController::new(StepperMotor::new(step_pin, dir_pin)),
            queue: CommandQueue::new(),
            stats: LinkStats::default(),
        }
    }

    /// Handle one complete line from the serial transport: parse and queue.
    ///
    /// A malformed line or a full queue drops the command; both are counted.
    /// The error is returned so the caller can report it on its side channel.
    pub fn on_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        self.stats.lines_received = self.stats.lines_received.wrapping_add(1);
        match parser::parse(line) {
            Ok(command) => {
                if !self.queue.enqueue(command) {
                    self.stats.queue_overflows = self.stats.queue_overflows.wrapping_add(1);
                }
                Ok(())
            }
            Err(error) => {
                self.stats.parse_errors = self.stats.parse_errors.wrapping_add(1);
                Err(error)
            }
        }
    }

    /// One main-loop tick: drain the queue in arrival order, then advance
    /// every state machine.
    ///
    /// The drain is bounded by the queue capacity; bytes received while
    /// draining become commands on the *next* poll.
    pub fn poll(&mut self, now_ms: u32, now_us: u32) {
        while let Some(command) = self.queue.dequeue() {
            self.execute(command, now_ms);
        }
        self.keys.update(now_ms);
        self.pedal.update(now_ms, now_us);
    }

    fn execute(&mut self, command: Command, now_ms: u32) {
        self.stats.commands_executed = self.stats.commands_executed.wrapping_add(1);
        match command {
            Command::Press {
                channel,
                duty_cycle,
                strike_time_ms,
                followup_duty_cycle,
                followup_time_ms,
            } => self.keys.press(
                channel as usize,
                duty_cycle,
                strike_time_ms,
                followup_duty_cycle,
                followup_time_ms,
                now_ms,
            ),
            Command::Release { channel, .. } => self.keys.release(channel as usize),
            Command::PedalPress => {
                if !self.pedal.enqueue(PedalCommand::Press) {
                    self.stats.queue_overflows = self.stats.queue_overflows.wrapping_add(1);
                }
            }
            Command::PedalRelease => {
                if !self.pedal.enqueue(PedalCommand::Release) {
                    self.stats.queue_overflows = self.stats.queue_overflows.wrapping_add(1);
                }
            }
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn keys(&self) -> &KeyDriver<P> {
        &self.keys
    }

    pub fn pedal(&self) -> &PedalController<STEP, DIR> {
        &self.pedal
    }

    pub fn pedal_mut(&mut self) -> &mut PedalController<STEP, DIR> {
        &mut self.pedal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::key_solenoid::{HOLD_DUTY_CYCLE, NUM_KEYS};
    use core::convert::Infallible;

    struct PwmLog {
        duty: [u8; NUM_KEYS],
    }

    impl PwmOutput for PwmLog {
        fn set_duty_cycle(&mut self, channel: usize, percent: u8) {
            self.duty[channel] = percent;
        }
    }

    struct MockPin;

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn board() -> DriverBoard<PwmLog, MockPin, MockPin> {
        DriverBoard::new(
            PwmLog {
                duty: [0xFF; NUM_KEYS],
            },
            MockPin,
            MockPin,
        )
    }

    fn duty(board: &DriverBoard<PwmLog, MockPin, MockPin>, channel: usize) -> u8 {
        board.keys().pwm().duty[channel]
    }

    #[test]
    fn test_press_line_drives_channel() {
        let mut board = board();
        assert!(board.on_line(b"P:11:80").is_ok());
        board.poll(0, 0);
        assert_eq!(duty(&board, 11), 80);
    }

    #[test]
    fn test_press_release_round_trip() {
        let mut board = board();
        board.on_line(b"P:3:80").unwrap();
        board.poll(0, 0);
        assert_eq!(duty(&board, 3), 80);

        board.on_line(b"R:3:0").unwrap();
        board.poll(1, 1_000);
        assert_eq!(duty(&board, 3), 0);
    }

    #[test]
    fn test_commands_execute_in_arrival_order() {
        let mut board = board();
        // Press then immediately release the same channel within one poll:
        // the release must win.
        board.on_line(b"P:5:90").unwrap();
        board.on_line(b"R:5:0").unwrap();
        board.poll(0, 0);
        assert_eq!(duty(&board, 5), 0);
    }

    #[test]
    fn test_full_profile_runs_through_poll() {
        let mut board = board();
        board.on_line(b"P:2:80:50:60:100").unwrap();
        board.poll(0, 0);
        assert_eq!(duty(&board, 2), 80);
        board.poll(50, 50_000);
        assert_eq!(duty(&board, 2), 60);
        board.poll(150, 150_000);
        assert_eq!(duty(&board, 2), HOLD_DUTY_CYCLE);
    }

    #[test]
    fn test_pedal_lines_route_to_pedal_queue() {
        let mut board = board();
        board.on_line(b"P:P").unwrap();
        board.on_line(b"R:P").unwrap();
        board.poll(0, 0);
        // Both requests queue; the throttle has not released either yet.
        assert_eq!(board.pedal().queued(), 2);

        board.poll(150, 150_000);
        assert_eq!(board.pedal().queued(), 1);
        assert!(board.pedal().motor().is_moving());
    }

    #[test]
    fn test_parse_error_counted_and_returned() {
        let mut board = board();
        assert!(board.on_line(b"P:99:80").is_err());
        board.poll(0, 0);

        let stats = board.stats();
        assert_eq!(stats.lines_received, 1);
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.commands_executed, 0);
        assert_eq!(duty(&board, 0), 0);
    }

    #[test]
    fn test_queue_overflow_drops_and_counts() {
        let mut board = board();
        for _ in 0..33 {
            board.on_line(b"P:0:50").unwrap();
        }
        let stats = board.stats();
        assert_eq!(stats.lines_received, 33);
        assert_eq!(stats.queue_overflows, 1);

        board.poll(0, 0);
        assert_eq!(board.stats().commands_executed, 32);
    }
}
