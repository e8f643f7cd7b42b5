// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod board;
pub mod pedal;

pub use board::{DriverBoard, LinkStats};
pub use pedal::{PedalCommand, PedalController};
