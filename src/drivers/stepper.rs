//! Step/dir driver for the sustain-pedal stepper motor.
//!
//! Two timing domains are involved. Deciding *when* to step depends on the
//! commanded speed (hundreds of µs to ms between steps); the electrical step
//! signal itself needs a minimum pulse width far below the main loop's
//! millisecond cadence. The driver therefore splits into a position state
//! machine and a tiny pulse sub-machine:
//!
//! ```text
//! pulse: Idle → PulseHigh (≥10 µs) → PulseLow (≥3 µs) → Idle
//! ```
//!
//! Both run off an injected microsecond timestamp, so [`StepperMotor::update`]
//! never blocks and the whole driver is testable with a fake clock. The
//! position only changes when a pulse fully completes.

use embedded_hal::digital::OutputPin;

/// Speed bounds in steps per second; `set_speed` clamps into this range.
pub const MAX_SPEED_STEPS_PER_SEC: u32 = 1500;
pub const MIN_SPEED_STEPS_PER_SEC: u32 = 100;

/// Minimum step-signal high time. The TB6600 needs 2.5 µs; 10 gives margin.
pub const STEP_PULSE_HIGH_US: u32 = 10;
/// Minimum step-signal low time before the next pulse may start.
pub const STEP_PULSE_LOW_US: u32 = 3;

/// Rotation direction as seen by the driver's DIR input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Non-blocking step pulse generator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PulseState {
    Idle,
    High { since_us: u32 },
    Low { since_us: u32 },
}

/// Compute the inter-step delay for a speed in steps per second.
///
/// A speed of zero maps to a one-second delay rather than dividing by zero.
fn step_delay_for(speed_steps_per_sec: u32) -> u32 {
    if speed_steps_per_sec == 0 {
        return 1_000_000;
    }
    1_000_000 / speed_steps_per_sec
}

/// Position/speed state machine over step and direction pins.
pub struct StepperMotor<STEP, DIR> {
    step_pin: STEP,
    dir_pin: DIR,
    current_position: i32,
    target_position: i32,
    current_speed: u32,
    direction: Direction,
    is_moving: bool,
    step_delay_us: u32,
    last_step_us: u32,
    pulse: PulseState,
    /// Direction latched when the in-flight pulse started, so a retarget
    /// mid-pulse cannot miscount the completing step.
    pulse_direction: Direction,
}

impl<STEP: OutputPin, DIR: OutputPin> StepperMotor<STEP, DIR> {
    /// Create the driver with both pins driven low and the motor at rest.
    pub fn new(mut step_pin: STEP, mut dir_pin: DIR) -> Self {
        step_pin.set_low().ok();
        dir_pin.set_low().ok();
        Self {
            step_pin,
            dir_pin,
            current_position: 0,
            target_position: 0,
            current_speed: MIN_SPEED_STEPS_PER_SEC,
            direction: Direction::Clockwise,
            is_moving: false,
            step_delay_us: step_delay_for(MIN_SPEED_STEPS_PER_SEC),
            last_step_us: 0,
            pulse: PulseState::Idle,
            pulse_direction: Direction::Clockwise,
        }
    }

    /// Command an absolute position. Equal target is a no-op.
    pub fn move_to(&mut self, target: i32) {
        self.target_position = target;
        if target > self.current_position {
            self.set_direction(Direction::Clockwise);
        } else if target < self.current_position {
            self.set_direction(Direction::CounterClockwise);
        } else {
            self.is_moving = false;
            return;
        }
        self.is_moving = true;
        self.step_delay_us = step_delay_for(self.current_speed);
    }

    /// Command a move relative to the current position.
    pub fn move_relative(&mut self, steps: i32) {
        self.move_to(self.current_position.saturating_add(steps));
    }

    /// Freeze in place: the current position becomes the target.
    pub fn stop(&mut self) {
        self.target_position = self.current_position;
        self.is_moving = false;
    }

    /// Set the speed, clamped into
    /// [`MIN_SPEED_STEPS_PER_SEC`]..=[`MAX_SPEED_STEPS_PER_SEC`].
    pub fn set_speed(&mut self, speed_steps_per_sec: u32) {
        self.current_speed =
            speed_steps_per_sec.clamp(MIN_SPEED_STEPS_PER_SEC, MAX_SPEED_STEPS_PER_SEC);
        self.step_delay_us = step_delay_for(self.current_speed);
    }

    /// Declare the current mechanical position to be step 0.
    pub fn zero(&mut self) {
        self.current_position = 0;
        self.target_position = 0;
        self.is_moving = false;
    }

    pub fn position(&self) -> i32 {
        self.current_position
    }

    pub fn target(&self) -> i32 {
        self.target_position
    }

    pub fn speed(&self) -> u32 {
        self.current_speed
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance both state machines. Call every loop iteration — the pulse
    /// timing is microsecond-scale and relies on frequent polling.
    pub fn update(&mut self, now_us: u32) {
        self.advance_pulse(now_us);

        if self.is_moving
            && self.pulse == PulseState::Idle
            && self.current_position != self.target_position
            && now_us.wrapping_sub(self.last_step_us) >= self.step_delay_us
        {
            self.start_pulse(now_us);
        }
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        match direction {
            Direction::Clockwise => self.dir_pin.set_low().ok(),
            Direction::CounterClockwise => self.dir_pin.set_high().ok(),
        };
    }

    /// One full blocking step at the driver's pulse timing. Calibration only;
    /// everything else goes through the non-blocking [`update`](Self::update).
    pub(crate) fn step_blocking(&mut self, delay_us: &mut dyn FnMut(u32)) {
        self.step_pin.set_high().ok();
        delay_us(STEP_PULSE_HIGH_US);
        self.step_pin.set_low().ok();
        delay_us(STEP_PULSE_LOW_US);
        self.apply_step(self.direction);
    }

    fn start_pulse(&mut self, now_us: u32) {
        self.step_pin.set_high().ok();
        self.pulse = PulseState::High { since_us: now_us };
        self.pulse_direction = self.direction;
        self.last_step_us = now_us;
    }

    fn advance_pulse(&mut self, now_us: u32) {
        match self.pulse {
            PulseState::Idle => {}
            PulseState::High { since_us } => {
                if now_us.wrapping_sub(since_us) >= STEP_PULSE_HIGH_US {
                    self.step_pin.set_low().ok();
                    self.pulse = PulseState::Low { since_us: now_us };
                }
            }
            PulseState::Low { since_us } => {
                if now_us.wrapping_sub(since_us) >= STEP_PULSE_LOW_US {
                    self.pulse = PulseState::Idle;
                    self.apply_step(self.pulse_direction);
                }
            }
        }
    }

    /// Record one completed mechanical step.
    fn apply_step(&mut self, direction: Direction) {
        match direction {
            Direction::Clockwise => self.current_position += 1,
            Direction::CounterClockwise => self.current_position -= 1,
        }
        if self.current_position == self.target_position {
            self.is_moving = false;
        }
    }
}
