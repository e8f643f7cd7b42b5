// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command messages for the keybed serial protocol.

use core::fmt;

/// A directive parsed from one complete serial line.
///
/// On the wire a value of `0` in an optional timing field means "not supplied"; the parser maps
/// that to `None` so a stored `Some(0)` can never be confused with an absent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Strike and hold a key channel.
    Press {
        channel: u8,
        duty_cycle: u8,
        /// Initial strike duration override (`None` = driver default).
        strike_time_ms: Option<u16>,
        /// Intermediate decay duty cycle; the follow-up stage only runs when
        /// both this and `followup_time_ms` are supplied.
        followup_duty_cycle: Option<u8>,
        followup_time_ms: Option<u16>,
    },
    /// Drop a key channel back to 0% duty. The duty field is carried through
    /// from the wire but execution always forces the output to zero.
    Release { channel: u8, duty_cycle: u8 },
    /// Engage the sustain pedal (`P:P`).
    PedalPress,
    /// Lift the sustain pedal (`R:P`).
    PedalRelease,
}

/// Reasons a received line is rejected. The whole line is discarded; no
/// partial command is ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Line shorter than the shortest valid command.
    TooShort,
    /// Command letter is not `P` or `R`.
    UnknownCommand,
    /// Expected `:` separator missing.
    MissingSeparator,
    /// A numeric field contained no digits.
    EmptyField,
    /// Channel outside 0..=11.
    ChannelOutOfRange,
    /// Duty cycle outside 0..=100.
    DutyOutOfRange,
    /// A timing field does not fit its declared width.
    ValueOutOfRange,
    /// More than three optional fields on a press command.
    TooManyParameters,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseError::TooShort => "line too short",
            ParseError::UnknownCommand => "unknown command letter",
            ParseError::MissingSeparator => "missing ':' separator",
            ParseError::EmptyField => "empty numeric field",
            ParseError::ChannelOutOfRange => "channel out of range",
            ParseError::DutyOutOfRange => "duty cycle out of range",
            ParseError::ValueOutOfRange => "field value out of range",
            ParseError::TooManyParameters => "too many parameters",
        };
        f.write_str(text)
    }
}
