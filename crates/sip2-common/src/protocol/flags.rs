use std::fmt;

use crate::protocol::error::{Result, Sip2Error};

/// Command codes in the order their flags appear in the `BX` field.
const ORDER: [&str; 16] = [
    "23", "11", "09", "01", "99", "97", "93", "63", "35", "37", "17", "19", "25", "15", "29", "65",
];

/// The 16-flag "supported messages" field of an ACS status response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupportedMessages {
    flags: [bool; 16],
}

impl SupportedMessages {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { flags: [true; 16] }
    }

    /// Returns whether the ACS advertises the given request command.
    ///
    /// Commands outside the table, such as responses, are never supported.
    pub fn supports(&self, command: &str) -> bool {
        ORDER
            .iter()
            .position(|c| *c == command)
            .map(|i| self.flags[i])
            .unwrap_or(false)
    }

    pub fn set(&mut self, command: &str, supported: bool) -> Result<&mut Self> {
        let index = ORDER
            .iter()
            .position(|c| *c == command)
            .ok_or_else(|| Sip2Error::MessageNotUnderstood(command.to_string()))?;
        self.flags[index] = supported;
        Ok(self)
    }

    /// Parses the wire form. Shorter values leave the trailing flags unset.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() > ORDER.len() {
            return Err(Sip2Error::InvalidFieldLength {
                field: "supported_messages".to_string(),
                expected: ORDER.len(),
                actual: raw.len(),
            });
        }

        let mut flags = [false; 16];
        for (i, c) in raw.chars().enumerate() {
            flags[i] = match c {
                'Y' | '1' => true,
                'N' | '0' | ' ' => false,
                _ => {
                    return Err(Sip2Error::InvalidFieldValue {
                        field: "supported_messages".to_string(),
                        value: raw.to_string(),
                        reason: "expected Y or N flags",
                    })
                }
            };
        }
        Ok(Self { flags })
    }
}

impl fmt::Display for SupportedMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in self.flags {
            f.write_str(if flag { "Y" } else { "N" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_positions() {
        let mut flags = SupportedMessages::none();
        flags.set("11", true).unwrap();
        flags.set("65", true).unwrap();
        assert_eq!(flags.to_string(), "NYNNNNNNNNNNNNNY");
        assert!(flags.supports("11"));
        assert!(!flags.supports("09"));
    }

    #[test]
    fn test_parse() {
        let flags = SupportedMessages::parse("YYYYYYYYYYYYYYYY").unwrap();
        assert_eq!(flags, SupportedMessages::all());

        let partial = SupportedMessages::parse("NY").unwrap();
        assert!(partial.supports("11"));
        assert!(!partial.supports("29"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(SupportedMessages::parse("YYYYYYYYYYYYYYYYY").is_err());
        assert!(SupportedMessages::parse("YX").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(!SupportedMessages::all().supports("12"));
        assert!(SupportedMessages::none().set("12", true).is_err());
    }
}
