// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod key_solenoid;
pub mod stepper;

pub use key_solenoid::{KeyDriver, PwmOutput};
pub use stepper::StepperMotor;
