// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decoding of encoded polylines (precision 5) into coordinates.

use crate::models::Coordinates;

/// Polyline precision used by the directions API.
const PRECISION: u32 = 5;

/// Offset applied to every encoded character.
const CHAR_OFFSET: u8 = 63;

/// Continuation bit of a 5-bit group.
const CONTINUATION: u8 = 0x20;

/// Errors from decoding a polyline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    #[error("invalid character {0:?} at byte {1}")]
    InvalidCharacter(char, usize),

    #[error("truncated value at end of input")]
    Truncated,

    #[error("odd number of values (latitude without longitude)")]
    UnpairedValue,

    #[error("failed to decode polyline: {0}")]
    Decode(String),
}

/// Decode an encoded polyline into an ordered list of coordinates.
///
/// The input is checked for structural problems up front so truncated
/// or garbled strings are rejected rather than decoded into nonsense.
pub fn decode(encoded: &str) -> Result<Vec<Coordinates>, PolylineError> {
    validate(encoded)?;

    let line = polyline::decode_polyline(encoded, PRECISION)
        .map_err(|e| PolylineError::Decode(e.to_string()))?;

    Ok(line
        .points()
        .map(Coordinates::from)
        .collect())
}

/// Every value must end on a terminating group, and values come in pairs.
fn validate(encoded: &str) -> Result<(), PolylineError> {
    let mut values = 0usize;
    let mut in_value = false;

    for (i, byte) in encoded.bytes().enumerate() {
        let chunk = byte
            .checked_sub(CHAR_OFFSET)
            .filter(|c| *c < 64)
            .ok_or(PolylineError::InvalidCharacter(char::from(byte), i))?;
        in_value = chunk & CONTINUATION != 0;
        if !in_value {
            values += 1;
        }
    }

    if in_value {
        return Err(PolylineError::Truncated);
    }
    if values % 2 != 0 {
        return Err(PolylineError::UnpairedValue);
    }
    Ok(())
}
