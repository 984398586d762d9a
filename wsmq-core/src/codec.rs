//! Typed value codec for message frames.
//!
//! All multi-byte values are little-endian and fixed width. The caller picks
//! the width for integers (1, 2 or 4 bytes) and floats (4 or 8 bytes); the
//! same width must be used to decode. Strings are one byte per character.

use bytes::Bytes;

use crate::error::{Result, WsmqError};

/// Widths accepted for signed and unsigned integers.
pub const INT_WIDTHS: &[usize] = &[1, 2, 4];

/// Widths accepted for floats.
pub const FLOAT_WIDTHS: &[usize] = &[4, 8];

/// Integer width used when the caller has no preference.
pub const DEFAULT_INT_WIDTH: usize = 4;

/// Float width used when the caller has no preference.
pub const DEFAULT_FLOAT_WIDTH: usize = 8;

fn check_width(width: usize, expected: &'static [usize]) -> Result<()> {
    if expected.contains(&width) {
        Ok(())
    } else {
        Err(WsmqError::InvalidFieldWidth { width, expected })
    }
}

/// Leading `width` bytes of `frame`. Trailing bytes are ignored.
fn field(frame: &[u8], width: usize) -> Result<&[u8]> {
    frame.get(..width).ok_or(WsmqError::FrameTooShort {
        needed: width,
        actual: frame.len(),
    })
}

/// Encode a boolean as a single `0`/`1` byte.
#[must_use]
pub fn encode_bool(value: bool) -> Bytes {
    Bytes::copy_from_slice(&[u8::from(value)])
}

/// Decode a boolean. Any non-zero first byte is `true`.
pub fn decode_bool(frame: &[u8]) -> Result<bool> {
    Ok(field(frame, 1)?[0] != 0)
}

/// Encode a signed integer in `width` bytes.
///
/// # Errors
///
/// `InvalidFieldWidth` for widths other than 1, 2 or 4 and
/// `ValueOutOfRange` when `value` does not fit.
pub fn encode_int(value: i64, width: usize) -> Result<Bytes> {
    check_width(width, INT_WIDTHS)?;
    let out_of_range = |_| WsmqError::ValueOutOfRange {
        value: i128::from(value),
        width,
    };

    let encoded = match width {
        1 => i8::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
        2 => i16::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
        _ => i32::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
    };
    Ok(Bytes::from(encoded))
}

/// Decode a signed integer stored in `width` bytes.
pub fn decode_int(frame: &[u8], width: usize) -> Result<i64> {
    check_width(width, INT_WIDTHS)?;
    let raw = field(frame, width)?;

    Ok(match width {
        1 => i64::from(i8::from_le_bytes([raw[0]])),
        2 => i64::from(i16::from_le_bytes([raw[0], raw[1]])),
        _ => i64::from(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
    })
}

/// Encode an unsigned integer in `width` bytes.
///
/// # Errors
///
/// `InvalidFieldWidth` for widths other than 1, 2 or 4 and
/// `ValueOutOfRange` when `value` does not fit.
pub fn encode_uint(value: u64, width: usize) -> Result<Bytes> {
    check_width(width, INT_WIDTHS)?;
    let out_of_range = |_| WsmqError::ValueOutOfRange {
        value: i128::from(value),
        width,
    };

    let encoded = match width {
        1 => u8::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
        2 => u16::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
        _ => u32::try_from(value).map_err(out_of_range)?.to_le_bytes().to_vec(),
    };
    Ok(Bytes::from(encoded))
}

/// Decode an unsigned integer stored in `width` bytes.
pub fn decode_uint(frame: &[u8], width: usize) -> Result<u64> {
    check_width(width, INT_WIDTHS)?;
    let raw = field(frame, width)?;

    Ok(match width {
        1 => u64::from(raw[0]),
        2 => u64::from(u16::from_le_bytes([raw[0], raw[1]])),
        _ => u64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
    })
}

/// Encode a float in `width` bytes. Width 4 stores an `f32` and loses precision.
pub fn encode_float(value: f64, width: usize) -> Result<Bytes> {
    check_width(width, FLOAT_WIDTHS)?;

    #[allow(clippy::cast_possible_truncation)]
    let encoded = match width {
        4 => (value as f32).to_le_bytes().to_vec(),
        _ => value.to_le_bytes().to_vec(),
    };
    Ok(Bytes::from(encoded))
}

/// Decode a float stored in `width` bytes.
pub fn decode_float(frame: &[u8], width: usize) -> Result<f64> {
    check_width(width, FLOAT_WIDTHS)?;
    let raw = field(frame, width)?;

    Ok(match width {
        4 => f64::from(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        _ => f64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]),
    })
}

/// Encode a string as one byte per character; non-ASCII characters become `?`.
#[must_use]
pub fn encode_str(value: &str) -> Bytes {
    value
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect::<Vec<u8>>()
        .into()
}

/// Decode a string, mapping every byte to one character.
#[must_use]
pub fn decode_str(frame: &[u8]) -> String {
    frame.iter().map(|&b| char::from(b)).collect()
}
