//! Checksum arithmetic.
//!
//! The checksum is the two's complement of the 16-bit sum of every byte in
//! the message up to and including the `AZ` tag, rendered as four uppercase
//! hex digits. Adding the checksum value back to the byte sum yields zero.

use crate::protocol::error::{Result, Sip2Error};

pub const CHECKSUM_TAG: &str = "AZ";
pub const CHECKSUM_WIDTH: usize = 4;

/// Length of the whole `AZxxxx` trailer.
pub const TRAILER_WIDTH: usize = CHECKSUM_TAG.len() + CHECKSUM_WIDTH;

pub fn compute(data: &str) -> u16 {
    data.bytes()
        .fold(0u16, |sum, b| sum.wrapping_add(u16::from(b)))
        .wrapping_neg()
}

pub fn render(data: &str) -> String {
    format!("{:04X}", compute(data))
}

/// Appends `AZ` and the checksum covering everything before it.
pub fn append(line: &mut String) {
    line.push_str(CHECKSUM_TAG);
    let value = render(line);
    line.push_str(&value);
}

/// Splits a line ending in `AZxxxx` into the covered text and the hex digits.
///
/// The covered text still ends with the `AZ` tag. Returns `None` if the line
/// has no well-formed trailer.
pub fn split(line: &str) -> Option<(&str, &str)> {
    let start = line.len().checked_sub(TRAILER_WIDTH)?;
    let trailer = line.get(start..)?;
    let digits = trailer.strip_prefix(CHECKSUM_TAG)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((&line[..start + CHECKSUM_TAG.len()], digits))
}

/// Checks a received checksum against the covered text.
///
/// Hex digits compare case-insensitively.
pub fn verify(covered: &str, received: &str) -> Result<()> {
    let calculated = compute(covered);
    match u16::from_str_radix(received, 16) {
        Ok(value) if value == calculated => Ok(()),
        _ => Err(Sip2Error::ChecksumError {
            received: received.to_string(),
            calculated,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_plus_checksum_is_zero() {
        let data = "9300CNuser|COpass|AY1AZ";
        let total = data
            .bytes()
            .fold(compute(data), |sum, b| sum.wrapping_add(u16::from(b)));
        assert_eq!(total, 0);
    }

    #[test]
    fn test_known_value() {
        assert_eq!(render("9900302.00AY1AZ"), "FCA5");
    }

    #[test]
    fn test_append_then_split_verifies() {
        let mut line = String::from("9900302.00AY1");
        append(&mut line);
        let (covered, digits) = split(&line).unwrap();
        assert!(covered.ends_with("AY1AZ"));
        verify(covered, digits).unwrap();
        verify(covered, &digits.to_lowercase()).unwrap();
    }

    #[test]
    fn test_split_requires_hex() {
        assert!(split("9900302.00AZ12G4").is_none());
        assert!(split("AZ1").is_none());
        assert!(split("9900302.00").is_none());
    }

    #[test]
    fn test_verify_mismatch() {
        let err = verify("9900302.00AY1AZ", "0000").unwrap_err();
        assert!(matches!(err, Sip2Error::ChecksumError { calculated: 0xFCA5, .. }));
    }
}
