//! Note-name helpers shared with the upstream MIDI-to-serial bridge.
//!
//! The bridge addresses keys by note name and MIDI velocity; the driver board
//! has 12 physical channels, one per semitone. Every octave folds onto the
//! same 12 channels, so the octave digit is carried by the wire format but
//! does not select a distinct channel set.

/// Sharp/flat modifier on a note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Sharp,
    Flat,
}

/// Map a note name onto a key channel (0..=11).
///
/// Returns `None` for letters outside `A..=G` (case-insensitive). Accidentals
/// shift by one semitone and wrap within the octave, so `B#` lands on channel
/// 0 and `Cb` on channel 11.
pub fn map_note_to_channel(letter: char, accidental: Option<Accidental>, _octave: u8) -> Option<u8> {
    let base: i8 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let offset: i8 = match accidental {
        Some(Accidental::Sharp) => 1,
        Some(Accidental::Flat) => -1,
        None => 0,
    };
    Some((base + offset).rem_euclid(12) as u8)
}

/// Rescale a MIDI velocity (0..=127) linearly into a duty cycle (0..=100).
pub fn velocity_to_duty(velocity: u8) -> u8 {
    let velocity = velocity.min(127) as u16;
    (velocity * 100 / 127) as u8
}
