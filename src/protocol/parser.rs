// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Message parser for the keybed command protocol.
//!
//! Grammar (one ASCII line, terminator already stripped):
//!
//! ```text
//! P:<channel 0-11>:<duty 0-100>[:<strike_ms>[:<followup_duty 0-100>[:<followup_ms>]]]
//! R:<channel 0-11>:<duty 0-100>
//! P:P | R:P          (sustain pedal)
//! ```
//!
//! Parsing is a pure function from bytes to [`Command`]; queueing is the
//! caller's concern. Every validation failure rejects the whole line.

use crate::drivers::key_solenoid::{MAX_DUTY_CYCLE, NUM_KEYS};
use crate::protocol::commands::{Command, ParseError};

/// Parse one complete line into a [`Command`].
pub fn parse(line: &[u8]) -> Result<Command, ParseError> {
    // "P:P" is the shortest accepted line.
    if line.len() < 3 {
        return Err(ParseError::TooShort);
    }

    let press = match line[0] {
        b'P' => true,
        b'R' => false,
        _ => return Err(ParseError::UnknownCommand),
    };
    if line[1] != b':' {
        return Err(ParseError::MissingSeparator);
    }

    // Sustain pedal target.
    if line.len() == 3 && line[2] == b'P' {
        return Ok(if press {
            Command::PedalPress
        } else {
            Command::PedalRelease
        });
    }

    let mut pos = 2;
    let channel = take_number(line, &mut pos)?;
    if channel >= NUM_KEYS as u32 {
        return Err(ParseError::ChannelOutOfRange);
    }
    expect_colon(line, &mut pos)?;
    let duty_cycle = take_number(line, &mut pos)?;
    if duty_cycle > MAX_DUTY_CYCLE as u32 {
        return Err(ParseError::DutyOutOfRange);
    }

    if !press {
        // Release lines are complete after the duty field; anything trailing
        // is ignored.
        return Ok(Command::Release {
            channel: channel as u8,
            duty_cycle: duty_cycle as u8,
        });
    }

    // Up to three positional optional fields: strike time, follow-up duty,
    // follow-up time.
    let mut optional = [0u32; 3];
    let mut supplied = 0;
    while pos < line.len() {
        expect_colon(line, &mut pos)?;
        if supplied == optional.len() {
            return Err(ParseError::TooManyParameters);
        }
        optional[supplied] = take_number(line, &mut pos)?;
        supplied += 1;
    }

    if optional[0] > u16::MAX as u32 || optional[2] > u16::MAX as u32 {
        return Err(ParseError::ValueOutOfRange);
    }
    if optional[1] > MAX_DUTY_CYCLE as u32 {
        return Err(ParseError::DutyOutOfRange);
    }

    Ok(Command::Press {
        channel: channel as u8,
        duty_cycle: duty_cycle as u8,
        strike_time_ms: nonzero_u16(optional[0]),
        followup_duty_cycle: match optional[1] {
            0 => None,
            duty => Some(duty as u8),
        },
        followup_time_ms: nonzero_u16(optional[2]),
    })
}

/// Consume a run of ASCII digits at `pos`. At least one digit is required.
fn take_number(line: &[u8], pos: &mut usize) -> Result<u32, ParseError> {
    let start = *pos;
    let mut value: u32 = 0;
    while *pos < line.len() && line[*pos].is_ascii_digit() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((line[*pos] - b'0') as u32))
            .ok_or(ParseError::ValueOutOfRange)?;
        *pos += 1;
    }
    if *pos == start {
        return Err(ParseError::EmptyField);
    }
    Ok(value)
}

fn expect_colon(line: &[u8], pos: &mut usize) -> Result<(), ParseError> {
    if *pos < line.len() && line[*pos] == b':' {
        *pos += 1;
        Ok(())
    } else {
        Err(ParseError::MissingSeparator)
    }
}

fn nonzero_u16(value: u32) -> Option<u16> {
    match value {
        0 => None,
        v => Some(v as u16),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press_all_channels_and_duties() {
        for channel in 0..=11u8 {
            for duty in [0u8, 1, 50, 99, 100] {
                let line = format!("P:{}:{}", channel, duty);
                assert_eq!(
                    parse(line.as_bytes()),
                    Ok(Command::Press {
                        channel,
                        duty_cycle: duty,
                        strike_time_ms: None,
                        followup_duty_cycle: None,
                        followup_time_ms: None,
                    })
                );
            }
        }
    }

    #[test]
    fn test_parse_release() {
        assert_eq!(
            parse(b"R:11:0"),
            Ok(Command::Release {
                channel: 11,
                duty_cycle: 0
            })
        );
        // The duty field is accepted verbatim on release lines.
        assert_eq!(
            parse(b"R:3:77"),
            Ok(Command::Release {
                channel: 3,
                duty_cycle: 77
            })
        );
    }

    #[test]
    fn test_parse_release_ignores_trailing_fields() {
        assert_eq!(
            parse(b"R:0:0:50:80:100"),
            Ok(Command::Release {
                channel: 0,
                duty_cycle: 0
            })
        );
    }

    #[test]
    fn test_parse_press_with_timing_overrides() {
        assert_eq!(
            parse(b"P:4:100:50"),
            Ok(Command::Press {
                channel: 4,
                duty_cycle: 100,
                strike_time_ms: Some(50),
                followup_duty_cycle: None,
                followup_time_ms: None,
            })
        );
        assert_eq!(
            parse(b"P:4:100:50:80:100"),
            Ok(Command::Press {
                channel: 4,
                duty_cycle: 100,
                strike_time_ms: Some(50),
                followup_duty_cycle: Some(80),
                followup_time_ms: Some(100),
            })
        );
    }

    #[test]
    fn test_parse_wire_zero_means_absent() {
        assert_eq!(
            parse(b"P:4:100:0:80:100"),
            Ok(Command::Press {
                channel: 4,
                duty_cycle: 100,
                strike_time_ms: None,
                followup_duty_cycle: Some(80),
                followup_time_ms: Some(100),
            })
        );
    }

    #[test]
    fn test_parse_pedal_lines() {
        assert_eq!(parse(b"P:P"), Ok(Command::PedalPress));
        assert_eq!(parse(b"R:P"), Ok(Command::PedalRelease));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(parse(b"P:12:50"), Err(ParseError::ChannelOutOfRange));
        assert_eq!(parse(b"P:100:50"), Err(ParseError::ChannelOutOfRange));
        assert_eq!(parse(b"P:0:101"), Err(ParseError::DutyOutOfRange));
        assert_eq!(parse(b"R:0:101"), Err(ParseError::DutyOutOfRange));
        assert_eq!(parse(b"P:0:50:50:101:100"), Err(ParseError::DutyOutOfRange));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse(b""), Err(ParseError::TooShort));
        assert_eq!(parse(b"P:"), Err(ParseError::TooShort));
        assert_eq!(parse(b"X:0:50"), Err(ParseError::UnknownCommand));
        assert_eq!(parse(b"P;0:50"), Err(ParseError::MissingSeparator));
        assert_eq!(parse(b"P:0 50"), Err(ParseError::MissingSeparator));
        assert_eq!(parse(b"P::50"), Err(ParseError::EmptyField));
        assert_eq!(parse(b"P:0:"), Err(ParseError::EmptyField));
        assert_eq!(parse(b"P:0:50:"), Err(ParseError::EmptyField));
        assert_eq!(parse(b"P:abc:50"), Err(ParseError::EmptyField));
    }

    #[test]
    fn test_parse_rejects_too_many_parameters() {
        assert_eq!(
            parse(b"P:0:50:50:80:100:7"),
            Err(ParseError::TooManyParameters)
        );
    }

    #[test]
    fn test_parse_rejects_oversized_values() {
        assert_eq!(parse(b"P:0:50:70000"), Err(ParseError::ValueOutOfRange));
        assert_eq!(
            parse(b"P:0:50:50:80:4294967296"),
            Err(ParseError::ValueOutOfRange)
        );
    }
}
