//! Declarative message layouts.
//!
//! Every SIP2 message is a two character command code followed by a run of
//! fixed-width positional fields and then any number of variable-length
//! tagged blocks of the form `TAGvalue|`. A [`MessageSchema`] describes one
//! such layout as static data. The codec walks it in both directions so no
//! message type needs hand-written framing code.

use std::collections::HashSet;
use std::fmt;

use crate::protocol::error::{Result, Sip2Error};

/// Width of the command code that starts every message.
pub const COMMAND_WIDTH: usize = 2;

/// Width of a tag identifier.
pub const TAG_WIDTH: usize = 2;

/// Width of a SIP2 timestamp (`YYYYMMDDZZZZHHMMSS`).
pub const DATE_WIDTH: usize = 18;

/// Longest value a tagged text field may carry.
pub const MAX_FIELD_LENGTH: usize = 255;

/// Block separator for tagged fields.
pub const FIELD_DELIMITER: char = '|';

/// How a boolean renders on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolStyle {
    /// `Y` / `N`
    YesNo,
    /// `1` / `0`
    Digit,
}

impl BoolStyle {
    pub fn render(self, value: bool) -> char {
        match (self, value) {
            (BoolStyle::YesNo, true) => 'Y',
            (BoolStyle::YesNo, false) => 'N',
            (BoolStyle::Digit, true) => '1',
            (BoolStyle::Digit, false) => '0',
        }
    }

    /// Parses a flag character.
    ///
    /// Both spellings are accepted regardless of style since equipment in the
    /// field mixes them. `Ok(None)` means the flag was blank or `U`nknown.
    pub fn parse(self, raw: &str) -> std::result::Result<Option<bool>, &'static str> {
        match raw {
            "Y" | "y" | "1" => Ok(Some(true)),
            "N" | "n" | "0" => Ok(Some(false)),
            "" | " " | "U" | "u" => Ok(None),
            _ => Err("expected a Y/N or 1/0 flag"),
        }
    }
}

/// Value type carried by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool(BoolStyle),
    Date,
    Text,
    Int,
    /// Repeated tag, collected in wire order. Tagged fields only.
    List,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool(_) => "boolean",
            FieldKind::Date => "timestamp",
            FieldKind::Text => "text",
            FieldKind::Int => "integer",
            FieldKind::List => "list",
        };
        f.write_str(name)
    }
}

/// Presence rule for a tagged field.
///
/// `Default` and `NotRequired` are indistinguishable on the wire: an unset
/// field of either policy is simply left out. The distinction documents
/// whether the protocol expects the field to normally be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    Required,
    NotRequired,
    Default,
}

/// A fixed-width field at a known offset.
///
/// Offsets count from the first byte after the command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalField {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
    /// Wire text emitted when the field is unset. Fields without a default
    /// are mandatory.
    pub default: Option<&'static str>,
}

impl PositionalField {
    pub const fn new(name: &'static str, offset: usize, width: usize, kind: FieldKind) -> Self {
        Self {
            name,
            offset,
            width,
            kind,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Exclusive end offset.
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// A `TAGvalue|` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedField {
    pub name: &'static str,
    pub tag: &'static str,
    pub kind: FieldKind,
    pub policy: FieldPolicy,
}

impl TaggedField {
    pub const fn new(
        name: &'static str,
        tag: &'static str,
        kind: FieldKind,
        policy: FieldPolicy,
    ) -> Self {
        Self {
            name,
            tag,
            kind,
            policy,
        }
    }

    pub fn is_required(&self) -> bool {
        self.policy == FieldPolicy::Required
    }
}

/// Layout of one message type.
#[derive(Debug, PartialEq, Eq)]
pub struct MessageSchema {
    pub command: &'static str,
    pub label: &'static str,
    /// Command code of the message an ACS answers this one with.
    pub response: Option<&'static str>,
    pub positional: &'static [PositionalField],
    pub tagged: &'static [TaggedField],
}

impl MessageSchema {
    /// Combined width of the positional section.
    pub fn fixed_width(&self) -> usize {
        self.positional.last().map(PositionalField::end).unwrap_or(0)
    }

    pub fn positional_field(&self, name: &str) -> Option<&'static PositionalField> {
        self.positional.iter().find(|f| f.name == name)
    }

    pub fn tagged_field(&self, name: &str) -> Option<&'static TaggedField> {
        self.tagged.iter().find(|f| f.name == name)
    }

    pub fn tagged_by_tag(&self, tag: &str) -> Option<&'static TaggedField> {
        self.tagged.iter().find(|f| f.tag == tag)
    }

    /// Resolves a field name to its canonical static name and kind.
    pub fn field(&self, name: &str) -> Option<(&'static str, FieldKind)> {
        self.positional_field(name)
            .map(|f| (f.name, f.kind))
            .or_else(|| self.tagged_field(name).map(|f| (f.name, f.kind)))
    }

    /// Tagged fields in the order they are written: ascending by tag.
    pub fn tagged_in_wire_order(&self) -> Vec<&'static TaggedField> {
        let mut fields: Vec<_> = self.tagged.iter().collect();
        fields.sort_by_key(|f| f.tag);
        fields
    }

    /// Checks the layout for internal consistency.
    ///
    /// Positional fields must tile the fixed section without gaps or
    /// overlaps, widths must suit their kinds, defaults must fill their
    /// field exactly, and names and tags must be unique.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| {
            Err(Sip2Error::Schema(format!(
                "{} ({}): {}",
                self.label, self.command, msg
            )))
        };

        let numeric = self.command.bytes().all(|b| b.is_ascii_digit());
        if self.command.len() != COMMAND_WIDTH || !numeric {
            return fail("command code must be two digits".to_string());
        }

        let mut names = HashSet::new();
        let mut cursor = 0;
        for field in self.positional {
            if field.offset != cursor {
                return fail(format!(
                    "{} starts at {} but the previous field ends at {}",
                    field.name, field.offset, cursor
                ));
            }
            if field.width == 0 {
                return fail(format!("{} has zero width", field.name));
            }
            match field.kind {
                FieldKind::Bool(_) if field.width != 1 => {
                    return fail(format!("flag {} must be one character wide", field.name));
                }
                FieldKind::Date if field.width != DATE_WIDTH => {
                    return fail(format!("timestamp {} must be {} wide", field.name, DATE_WIDTH));
                }
                FieldKind::List => {
                    return fail(format!("{} cannot be a positional list", field.name));
                }
                _ => {}
            }
            if let Some(default) = field.default {
                if default.len() != field.width {
                    return fail(format!("default for {} does not fill its width", field.name));
                }
            }
            if !names.insert(field.name) {
                return fail(format!("duplicate field name {}", field.name));
            }
            cursor = field.end();
        }

        let mut tags = HashSet::new();
        for field in self.tagged {
            if field.tag.len() != TAG_WIDTH || !field.tag.bytes().all(|b| b.is_ascii_uppercase()) {
                return fail(format!("{} has malformed tag {:?}", field.name, field.tag));
            }
            if field.tag == "AY" || field.tag == "AZ" {
                return fail(format!("{} reuses the reserved tag {}", field.name, field.tag));
            }
            if !tags.insert(field.tag) {
                return fail(format!("duplicate tag {}", field.tag));
            }
            if !names.insert(field.name) {
                return fail(format!("duplicate field name {}", field.name));
            }
        }

        Ok(())
    }
}
