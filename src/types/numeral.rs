//! Numeric encodings packed into packet payloads
//!
//! The feed mixes three encodings in the same payload shape:
//!
//! - ASCII decimal behind a one byte format marker (event numbers)
//! - little-endian binary counters of any width (key frame numbers)
//! - colon separated durations, `H:MM:SS` (session clock)
//!
//! Payloads are trusted to be well formed. Arithmetic wraps instead of
//! checking digits, so a malformed payload yields a wrong number but never
//! a panic.

/// Decode an ASCII decimal number, skipping the leading format marker byte.
pub fn decimal_after_marker(payload: &[u8]) -> u32 {
    payload.iter().skip(1).fold(0u32, |number, &digit| accumulate_digit(number, digit))
}

/// Decode an unsigned little-endian counter of any width.
///
/// Bytes beyond the fourth shift the low bytes out, matching a 32-bit
/// accumulator.
pub fn little_endian_counter(payload: &[u8]) -> u32 {
    payload.iter().rev().fold(0u32, |number, &byte| (number << 8) | u32::from(byte))
}

/// Decode a colon separated duration into seconds.
///
/// Each `:` folds the digits read so far into the running total in base 60,
/// so `"1:02:03"`, `"62:03"` and `"3723"` all decode to 3723.
pub fn duration_seconds(payload: &[u8]) -> u32 {
    let (total, number) = payload.iter().fold((0u32, 0u32), |(total, number), &byte| {
        if byte == b':' {
            (fold_sexagesimal(total, number), 0)
        } else {
            (total, accumulate_digit(number, byte))
        }
    });
    fold_sexagesimal(total, number)
}

fn accumulate_digit(number: u32, digit: u8) -> u32 {
    number.wrapping_mul(10).wrapping_add(u32::from(digit.wrapping_sub(b'0')))
}

fn fold_sexagesimal(total: u32, number: u32) -> u32 {
    total.wrapping_mul(60).wrapping_add(number)
}
