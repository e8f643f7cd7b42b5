// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Keybed Firmware
//!
//! This crate contains the driver-board firmware for a solenoid player piano, written in Rust,
//! targeting an STM32F7 MCU. The board actuates 12 solenoid-driven key channels over PWM and a
//! sustain-pedal stepper mechanism, both driven from a single non-blocking polling loop fed by an
//! ASCII serial command protocol.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`protocol`] | Serial line protocol: parser, command queue, line framing, note mapping |
//! | [`drivers`] | Actuator drivers (solenoid key channels, pedal stepper) |
//! | [`control`] | Board composition and pedal motion policy |
//! | [`hw`] | MCU-level wrappers around USART, timers, PWM, ADC (feature `hardware`) |
//!
//! ## Getting Started
//!
//! Run the host test suite:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features hardware
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod drivers;
#[cfg(feature = "hardware")]
pub mod hw;
pub mod protocol;
