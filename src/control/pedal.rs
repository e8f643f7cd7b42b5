// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Sustain-pedal motion policy on top of the stepper driver.
//!
//! The pedal linkage needs settling time between moves, so queued commands
//! are throttled: at most one executes per update, only while the motor is
//! stopped, and never within 150 ms of the previous one. This is deliberately
//! different from the key command queue, which drains completely every poll.
//!
//! Two further policies live here: an idle timeout that parks the mechanism
//! after the pedal has sat released for a while, and a pressure-sensor homing
//! routine that gives the step counter a physical zero at startup.

use embedded_hal::digital::OutputPin;
use heapless::Deque;

use crate::drivers::stepper::{Direction, StepperMotor};

/// Pedal command queue capacity.
pub const PEDAL_QUEUE_DEPTH: usize = 8;
/// Minimum spacing between two *executed* queue commands.
pub const MIN_COMMAND_INTERVAL_MS: u32 = 150;
/// Released-and-untouched interval after which the mechanism auto-parks.
pub const IDLE_TIMEOUT_MS: u32 = 15_000;

/// Step positions, relative to the calibrated home (the pressed hard stop).
pub const PEDAL_PRESSED_POSITION: i32 = 200;
pub const PEDAL_RELEASED_POSITION: i32 = 1000;
pub const PEDAL_REST_POSITION: i32 = 1200;

/// Normal operating speed in steps per second.
pub const PEDAL_SPEED_STEPS_PER_SEC: u32 = 1000;
/// Reduced homing speed.
pub const CALIBRATION_SPEED_STEPS_PER_SEC: u32 = 200;
/// Safety cutoff: homing never issues more steps than this.
pub const CALIBRATION_MAX_STEPS: u32 = 4000;
/// Pressure reading that counts as "pedal against the stop": ~3.0 V on a
/// 12-bit ADC referenced to 3.3 V.
pub const PRESSURE_PRESSED_THRESHOLD: u16 = 3700;

/// Motion requests accepted by the pedal queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedalCommand {
    MoveTo(i32),
    MoveRelative(i32),
    MoveToRest,
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastAction {
    None,
    Pressed,
    Released,
}

/// Queued, throttled controller for the sustain-pedal stepper.
pub struct PedalController<STEP, DIR> {
    motor: StepperMotor<STEP, DIR>,
    queue: Deque<PedalCommand, PEDAL_QUEUE_DEPTH>,
    last_command_ms: u32,
    last_action: LastAction,
    last_action_ms: u32,
}

impl<STEP: OutputPin, DIR: OutputPin> PedalController<STEP, DIR> {
    pub fn new(mut motor: StepperMotor<STEP, DIR>) -> Self {
        motor.set_speed(PEDAL_SPEED_STEPS_PER_SEC);
        Self {
            motor,
            queue: Deque::new(),
            last_command_ms: 0,
            last_action: LastAction::None,
            last_action_ms: 0,
        }
    }

    /// Queue a motion request. Returns `false` (request dropped) when full.
    pub fn enqueue(&mut self, command: PedalCommand) -> bool {
        self.queue.push_back(command).is_ok()
    }

    /// Number of requests waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// One main-loop tick: advance the motor, maybe execute one queued
    /// command, check the idle timeout.
    pub fn update(&mut self, now_ms: u32, now_us: u32) {
        self.motor.update(now_us);
        self.process_queue(now_ms);
        self.check_idle_timeout(now_ms);
    }

    fn process_queue(&mut self, now_ms: u32) {
        if self.motor.is_moving() {
            return;
        }
        if now_ms.wrapping_sub(self.last_command_ms) < MIN_COMMAND_INTERVAL_MS {
            return;
        }
        let Some(command) = self.queue.pop_front() else {
            return;
        };
        self.execute(command, now_ms);
        self.last_command_ms = now_ms;
    }

    fn execute(&mut self, command: PedalCommand, now_ms: u32) {
        match command {
            PedalCommand::MoveTo(position) => self.motor.move_to(position),
            PedalCommand::MoveRelative(steps) => self.motor.move_relative(steps),
            PedalCommand::MoveToRest => {
                self.motor.move_to(PEDAL_REST_POSITION);
                self.last_action = LastAction::None;
            }
            PedalCommand::Press => {
                self.motor.move_to(PEDAL_PRESSED_POSITION);
                self.last_action = LastAction::Pressed;
                self.last_action_ms = now_ms;
            }
            PedalCommand::Release => {
                self.motor.move_to(PEDAL_RELEASED_POSITION);
                self.last_action = LastAction::Released;
                self.last_action_ms = now_ms;
            }
        }
    }

    fn check_idle_timeout(&mut self, now_ms: u32) {
        if self.last_action == LastAction::Released
            && now_ms.wrapping_sub(self.last_action_ms) >= IDLE_TIMEOUT_MS
        {
            // Park to cut coil current and linkage wear; fires once.
            self.motor.move_to(PEDAL_REST_POSITION);
            self.last_action = LastAction::None;
        }
    }

    /// Home the mechanism against the pressure sensor.
    ///
    /// Drives toward the pressed hard stop at reduced speed until
    /// `read_pressure` crosses [`PRESSURE_PRESSED_THRESHOLD`] or
    /// [`CALIBRATION_MAX_STEPS`] have been issued, whichever comes first.
    /// Either way the position is zeroed — for a mechanical linkage an
    /// approximate home beats an undefined one. The only blocking loop in
    /// the firmware, and it is bounded by the step cutoff.
    pub fn calibrate(
        &mut self,
        mut read_pressure: impl FnMut() -> u16,
        mut delay_us: impl FnMut(u32),
    ) {
        self.motor.set_speed(CALIBRATION_SPEED_STEPS_PER_SEC);
        self.motor.set_direction(Direction::CounterClockwise);

        let step_period_us = 1_000_000 / CALIBRATION_SPEED_STEPS_PER_SEC;
        for _ in 0..CALIBRATION_MAX_STEPS {
            if read_pressure() >= PRESSURE_PRESSED_THRESHOLD {
                break;
            }
            self.motor.step_blocking(&mut delay_us);
            delay_us(step_period_us);
        }

        self.motor.zero();
        self.motor.set_speed(PEDAL_SPEED_STEPS_PER_SEC);
    }

    pub fn motor(&self) -> &StepperMotor<STEP, DIR> {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut StepperMotor<STEP, DIR> {
        &mut self.motor
    }
}
