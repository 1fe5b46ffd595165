use tracing::trace;

use crate::protocol::catalog;
use crate::protocol::checksum;
use crate::protocol::datetime;
use crate::protocol::error::{Result, Sip2Error};
use crate::protocol::message::{Message, Value};
use crate::protocol::schema::{
    FieldKind, PositionalField, TaggedField, COMMAND_WIDTH, FIELD_DELIMITER, MAX_FIELD_LENGTH,
    TAG_WIDTH,
};
use crate::protocol::sequence;

/// Error-detection features in force on a link.
///
/// With `checksum` on, encoded lines end in an `AZ` checksum and decoded
/// lines must carry a valid one. With `sequence` on, requests carry an `AY`
/// digit that the peer must echo. Enforcing the presence and value of that
/// digit is the job of the client and session, which know what to expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorDetection {
    pub checksum: bool,
    pub sequence: bool,
}

impl ErrorDetection {
    pub const OFF: ErrorDetection = ErrorDetection {
        checksum: false,
        sequence: false,
    };

    pub const FULL: ErrorDetection = ErrorDetection {
        checksum: true,
        sequence: true,
    };

    pub fn new(checksum: bool, sequence: bool) -> Self {
        Self { checksum, sequence }
    }

    /// Infers the features a peer is using from one of its lines.
    pub fn detect(line: &str) -> Self {
        let trailer = Trailer::split(line.trim_end_matches(['\r', '\n']));
        Self {
            checksum: trailer.checksum.is_some(),
            sequence: trailer.sequence.is_some(),
        }
    }

    /// Features on in either `self` or `other`.
    pub fn union(self, other: ErrorDetection) -> Self {
        Self {
            checksum: self.checksum || other.checksum,
            sequence: self.sequence || other.sequence,
        }
    }
}

/// A decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message: Message,
    /// Digit from the `AY` block, if the line carried one.
    pub sequence: Option<u8>,
}

/// The error-detection trailer of a raw line, split into its parts.
struct Trailer<'a> {
    /// Command code, positional section and tagged blocks.
    body: &'a str,
    sequence: Option<u8>,
    /// Covered text (ending in `AZ`) and received hex digits.
    checksum: Option<(&'a str, &'a str)>,
}

impl<'a> Trailer<'a> {
    fn split(line: &'a str) -> Self {
        // Trailer blocks may only follow the positional section.
        let min = line
            .get(..COMMAND_WIDTH)
            .and_then(catalog::lookup)
            .map(|schema| COMMAND_WIDTH + schema.fixed_width())
            .unwrap_or(COMMAND_WIDTH);

        let (rest, checksum) = match checksum::split(line) {
            Some((covered, digits)) if covered.len() - checksum::CHECKSUM_TAG.len() >= min => (
                &covered[..covered.len() - checksum::CHECKSUM_TAG.len()],
                Some((covered, digits)),
            ),
            _ => (line, None),
        };
        let (body, sequence) = sequence::split(rest, min);

        Self {
            body,
            sequence,
            checksum,
        }
    }
}

/// Encodes messages to SIP2 lines and decodes lines back to messages.
///
/// Lines are handled without their `\r` terminator; the channel adds and
/// strips it.
///
/// # Example
///
/// ```
/// use sip2_common::protocol::{catalog, Message};
/// use sip2_common::transport::{Codec, ErrorDetection};
///
/// let codec = Codec::new(ErrorDetection::FULL);
/// let status = Message::new(&catalog::SC_STATUS);
///
/// let line = codec.encode(&status, Some(1)).unwrap();
/// assert_eq!(line, "9900002.00AY1AZFCA8");
///
/// let frame = codec.decode(&line).unwrap();
/// assert_eq!(frame.message.text("protocol_version"), Some("2.00"));
/// assert_eq!(frame.sequence, Some(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    mode: ErrorDetection,
}

impl Codec {
    pub fn new(mode: ErrorDetection) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ErrorDetection {
        self.mode
    }

    /// Encodes a message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to encode
    /// * `sequence` - Digit for the `AY` block, or `None` to omit it
    ///
    /// # Returns
    ///
    /// The wire line without terminator: command code, positional fields,
    /// tagged blocks in ascending tag order, then `AY` and `AZ` if in use.
    ///
    /// # Errors
    ///
    /// - `MandatoryFieldOmitted` if a positional field without default or a
    ///   required tagged field is unset
    /// - `InvalidFieldLength` if a value does not fit its field
    /// - `InvalidFieldValue` if a value contains a delimiter or control character
    pub fn encode(&self, message: &Message, sequence: Option<u8>) -> Result<String> {
        let schema = message.schema();
        let mut line = String::with_capacity(COMMAND_WIDTH + schema.fixed_width() + 64);
        line.push_str(schema.command);

        for field in schema.positional {
            match message.get(field.name) {
                Some(value) => encode_positional(field, value, &mut line)?,
                None => match field.default {
                    Some(default) => line.push_str(default),
                    None => {
                        return Err(Sip2Error::MandatoryFieldOmitted {
                            command: schema.command,
                            field: field.name,
                        })
                    }
                },
            }
        }

        for field in schema.tagged_in_wire_order() {
            match message.get(field.name) {
                Some(value) => encode_tagged(field, value, &mut line)?,
                None if field.is_required() => {
                    return Err(Sip2Error::MandatoryFieldOmitted {
                        command: schema.command,
                        field: field.name,
                    })
                }
                None => {}
            }
        }

        if let Some(digit) = sequence {
            line.push_str(sequence::SEQUENCE_TAG);
            line.push(sequence::render(digit));
        }

        if self.mode.checksum {
            checksum::append(&mut line);
        }

        Ok(line)
    }

    /// Decodes one line.
    ///
    /// A trailing `\r` or `\n` is tolerated. With checksum enforcement on,
    /// the line must end in a valid `AZ` block. Unknown tags are skipped.
    ///
    /// # Errors
    ///
    /// - `MessageNotUnderstood` for a short line or unknown command code
    /// - `ChecksumError` for a missing or wrong checksum under enforcement
    /// - `InvalidFieldLength` if the positional section is truncated
    /// - `InvalidFieldValue` for values that do not parse as their kind
    /// - `MandatoryFieldOmitted` if a required tag is absent
    pub fn decode(&self, line: &str) -> Result<Frame> {
        let line = line.trim_end_matches(['\r', '\n']);
        let command = line
            .get(..COMMAND_WIDTH)
            .ok_or_else(|| Sip2Error::MessageNotUnderstood(line.to_string()))?;
        let schema = catalog::require(command)?;

        let trailer = Trailer::split(line);
        match trailer.checksum {
            Some((covered, digits)) if self.mode.checksum => checksum::verify(covered, digits)?,
            None if self.mode.checksum => {
                return Err(Sip2Error::ChecksumError {
                    received: String::new(),
                    calculated: checksum::compute(line),
                })
            }
            _ => {}
        }

        let body = trailer.body;
        let fixed_end = COMMAND_WIDTH + schema.fixed_width();
        if body.len() < fixed_end {
            return Err(Sip2Error::InvalidFieldLength {
                field: schema.label.to_string(),
                expected: schema.fixed_width(),
                actual: body.len() - COMMAND_WIDTH,
            });
        }

        let mut message = Message::new(schema);
        for field in schema.positional {
            let raw = body
                .get(COMMAND_WIDTH + field.offset..COMMAND_WIDTH + field.end())
                .ok_or_else(|| invalid(field.name, body, "not valid ASCII"))?;
            if let Some(value) = decode_positional(field, raw)? {
                message.insert(field.name, value);
            }
        }

        let tagged = body
            .get(fixed_end..)
            .ok_or_else(|| invalid(schema.label, body, "not valid ASCII"))?;
        for block in tagged.split(FIELD_DELIMITER).filter(|b| !b.is_empty()) {
            let (tag, raw) = match (block.get(..TAG_WIDTH), block.get(TAG_WIDTH..)) {
                (Some(tag), Some(raw)) => (tag, raw),
                _ => return Err(invalid(schema.label, block, "truncated tagged field")),
            };
            match schema.tagged_by_tag(tag) {
                Some(field) => decode_tagged(field, raw, &mut message)?,
                None => trace!("Skipping unknown tag {} in {} message", tag, schema.command),
            }
        }

        if let Some(field) = schema
            .tagged
            .iter()
            .find(|f| f.is_required() && !message.is_set(f.name))
        {
            return Err(Sip2Error::MandatoryFieldOmitted {
                command: schema.command,
                field: field.name,
            });
        }

        Ok(Frame {
            message,
            sequence: trailer.sequence,
        })
    }
}

fn invalid(field: &str, value: &str, reason: &'static str) -> Sip2Error {
    Sip2Error::InvalidFieldValue {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn check_text(field: &str, value: &str) -> Result<()> {
    if value.contains(FIELD_DELIMITER) {
        return Err(invalid(field, value, "contains the field delimiter"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid(field, value, "contains a control character"));
    }
    Ok(())
}

fn encode_positional(field: &PositionalField, value: &Value, line: &mut String) -> Result<()> {
    let text = match (field.kind, value) {
        (FieldKind::Bool(style), Value::Bool(b)) => style.render(*b).to_string(),
        (FieldKind::Date, Value::Date(d)) => datetime::format(d),
        (FieldKind::Int, Value::Int(n)) => format!("{:0width$}", n, width = field.width),
        (FieldKind::Text, Value::Text(s)) => {
            check_text(field.name, s)?;
            s.clone()
        }
        (kind, _) => {
            return Err(Sip2Error::FieldType {
                field: field.name,
                expected: kind,
            })
        }
    };

    if text.len() != field.width {
        return Err(Sip2Error::InvalidFieldLength {
            field: field.name.to_string(),
            expected: field.width,
            actual: text.len(),
        });
    }
    line.push_str(&text);
    Ok(())
}

fn encode_tagged(field: &TaggedField, value: &Value, line: &mut String) -> Result<()> {
    let mut push = |text: &str| -> Result<()> {
        if text.len() > MAX_FIELD_LENGTH {
            return Err(Sip2Error::InvalidFieldLength {
                field: field.name.to_string(),
                expected: MAX_FIELD_LENGTH,
                actual: text.len(),
            });
        }
        check_text(field.name, text)?;
        line.push_str(field.tag);
        line.push_str(text);
        line.push(FIELD_DELIMITER);
        Ok(())
    };

    match (field.kind, value) {
        (FieldKind::Bool(style), Value::Bool(b)) => push(&style.render(*b).to_string()),
        (FieldKind::Date, Value::Date(d)) => push(&datetime::format(d)),
        (FieldKind::Int, Value::Int(n)) => push(&n.to_string()),
        (FieldKind::Text, Value::Text(s)) => push(s),
        (FieldKind::List, Value::List(items)) => items.iter().try_for_each(|item| push(item)),
        (kind, _) => Err(Sip2Error::FieldType {
            field: field.name,
            expected: kind,
        }),
    }
}

fn decode_positional(field: &PositionalField, raw: &str) -> Result<Option<Value>> {
    let value = match field.kind {
        FieldKind::Bool(style) => style
            .parse(raw)
            .map_err(|reason| invalid(field.name, raw, reason))?
            .map(Value::Bool),
        FieldKind::Date => datetime::parse(raw)
            .map_err(|reason| invalid(field.name, raw, reason))?
            .map(Value::Date),
        FieldKind::Int => parse_int(field.name, raw)?.map(Value::Int),
        FieldKind::Text => Some(Value::Text(raw.to_string())),
        FieldKind::List => return Err(invalid(field.name, raw, "lists cannot be positional")),
    };
    Ok(value)
}

fn decode_tagged(field: &'static TaggedField, raw: &str, message: &mut Message) -> Result<()> {
    let value = match field.kind {
        FieldKind::Bool(style) => style
            .parse(raw)
            .map_err(|reason| invalid(field.name, raw, reason))?
            .map(Value::Bool),
        FieldKind::Date => datetime::parse(raw)
            .map_err(|reason| invalid(field.name, raw, reason))?
            .map(Value::Date),
        FieldKind::Int => parse_int(field.name, raw)?.map(Value::Int),
        FieldKind::Text => Some(Value::Text(raw.to_string())),
        FieldKind::List => {
            message.push_item(field.name, raw.to_string());
            return Ok(());
        }
    };

    // A repeated non-list tag keeps the last value.
    if let Some(value) = value {
        message.insert(field.name, value);
    }
    Ok(())
}

fn parse_int(name: &str, raw: &str) -> Result<Option<u32>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(name, raw, "expected decimal digits"));
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| invalid(name, raw, "number out of range"))
}
