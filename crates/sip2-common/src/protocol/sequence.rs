//! Sequence numbers.
//!
//! When sequence checking is on, every request carries an `AY` block holding
//! a single digit. The ACS echoes that digit in its response and the SC moves
//! to the next digit, wrapping from 9 back to 0, only after accepting one.

use crate::protocol::error::{Result, Sip2Error};

pub const SEQUENCE_TAG: &str = "AY";

/// Length of the whole `AYn` block.
pub const SEQUENCE_WIDTH: usize = SEQUENCE_TAG.len() + 1;

pub const fn next_digit(digit: u8) -> u8 {
    (digit + 1) % 10
}

pub fn render(digit: u8) -> char {
    char::from(b'0' + digit % 10)
}

/// Splits a trailing `AYn` block off `body`.
///
/// `min` is the offset where tagged blocks begin. The block must start there
/// or right after a `|` delimiter, which keeps a tagged value that happens to
/// end in `AY7` from being mistaken for a sequence number.
pub fn split(body: &str, min: usize) -> (&str, Option<u8>) {
    let Some(start) = body.len().checked_sub(SEQUENCE_WIDTH) else {
        return (body, None);
    };
    if start < min {
        return (body, None);
    }

    let bytes = body.as_bytes();
    let at_boundary = start == min || bytes[start - 1] == b'|';
    let digit = bytes[start + 2];
    let tagged = &bytes[start..start + 2] == SEQUENCE_TAG.as_bytes();
    if at_boundary && tagged && digit.is_ascii_digit() {
        (&body[..start], Some(digit - b'0'))
    } else {
        (body, None)
    }
}

/// Client-side counter: the digit to attach to the next request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter {
    current: u8,
}

impl SequenceCounter {
    pub fn new(start: u8) -> Self {
        Self { current: start % 10 }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn advance(&mut self) {
        self.current = next_digit(self.current);
    }

    /// Checks that a response echoes the digit in flight.
    pub fn verify(&self, received: Option<u8>) -> Result<()> {
        if received == Some(self.current) {
            Ok(())
        } else {
            Err(Sip2Error::SequenceError {
                expected: self.current,
                received,
            })
        }
    }
}

/// How an incoming request's digit relates to the last one answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// A new request.
    Fresh,
    /// The SC repeated the last request, most likely because it never saw
    /// our answer.
    Retransmission,
}

/// Server-side tracker of the last digit answered on a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceTracker {
    last: Option<u8>,
}

impl SequenceTracker {
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Digit the next fresh request should carry, if any has been seen.
    pub fn expected(&self) -> Option<u8> {
        self.last.map(next_digit)
    }

    /// Classifies an incoming digit.
    ///
    /// The first digit of a session is taken as-is. After that only a repeat
    /// of the last digit or its successor is accepted.
    pub fn classify(&self, received: Option<u8>) -> Result<SequenceCheck> {
        let Some(digit) = received else {
            return Err(Sip2Error::SequenceError {
                expected: self.expected().unwrap_or(0),
                received: None,
            });
        };
        match self.last {
            None => Ok(SequenceCheck::Fresh),
            Some(last) if last == digit => Ok(SequenceCheck::Retransmission),
            Some(last) if next_digit(last) == digit => Ok(SequenceCheck::Fresh),
            Some(last) => Err(Sip2Error::SequenceError {
                expected: next_digit(last),
                received,
            }),
        }
    }

    pub fn record(&mut self, digit: u8) {
        self.last = Some(digit % 10);
    }

    /// Forgets the history, as after a new SC status or login.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
