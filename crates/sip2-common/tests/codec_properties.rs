//! Property-based tests for the error-detection trailer and codec.
//!
//! These tests use proptest to verify invariants hold for arbitrary input:
//! - A single changed byte always changes the checksum
//! - Appended checksums always verify
//! - Sequence digits cycle through 0..=9
//! - Decoding arbitrary text never panics

use chrono::NaiveDate;
use proptest::prelude::*;
use sip2_common::protocol::{catalog, checksum, sequence, Message, SequenceCounter};
use sip2_common::transport::{Codec, ErrorDetection};

// Strategy for printable ASCII payloads like those found on the wire
fn payload_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,200}"
}

// Strategy for tagged field values: printable ASCII without the delimiter
fn field_value_strategy() -> impl Strategy<Value = String> {
    "[ -{}~]{0,40}"
}

#[test]
fn prop_single_byte_change_alters_checksum() {
    proptest!(|(
        payload in payload_strategy(),
        index in any::<prop::sample::Index>(),
        replacement in 0x20u8..0x7f
    )| {
        let mut bytes = payload.clone().into_bytes();
        let i = index.index(bytes.len());
        prop_assume!(bytes[i] != replacement);
        bytes[i] = replacement;
        let mutated = String::from_utf8(bytes).unwrap();

        prop_assert_ne!(checksum::compute(&payload), checksum::compute(&mutated));
    });
}

#[test]
fn prop_appended_checksum_verifies() {
    proptest!(|(payload in payload_strategy())| {
        let mut line = payload.clone();
        checksum::append(&mut line);

        let (covered, digits) = checksum::split(&line).unwrap();
        prop_assert_eq!(covered.len(), payload.len() + 2);
        prop_assert!(checksum::verify(covered, digits).is_ok());
    });
}

#[test]
fn prop_sequence_cycles() {
    proptest!(|(start in 0u8..10, steps in 0usize..100)| {
        let mut counter = SequenceCounter::new(start);
        for _ in 0..steps {
            counter.advance();
        }
        prop_assert_eq!(usize::from(counter.current()), (usize::from(start) + steps) % 10);
        prop_assert_eq!(sequence::next_digit(counter.current()), (counter.current() + 1) % 10);
    });
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(line in "\\PC{0,120}")| {
        let _ = Codec::new(ErrorDetection::FULL).decode(&line);
        let _ = Codec::new(ErrorDetection::OFF).decode(&line);
    });
}

#[test]
fn prop_patron_fields_round_trip() {
    proptest!(|(
        patron in field_value_strategy(),
        password in field_value_strategy(),
        digit in 0u8..10
    )| {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let mut request = Message::new(&catalog::PATRON_STATUS_REQUEST);
        request
            .set("language", "001").unwrap()
            .set("transaction_date", date).unwrap()
            .set("patron_identifier", patron.as_str()).unwrap()
            .set("patron_password", password.as_str()).unwrap();

        let codec = Codec::new(ErrorDetection::FULL);
        let line = codec.encode(&request, Some(digit)).unwrap();
        let frame = codec.decode(&line).unwrap();

        prop_assert_eq!(frame.sequence, Some(digit));
        prop_assert_eq!(frame.message, request);
    });
}
