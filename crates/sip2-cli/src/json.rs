//! JSON rendering of SIP2 messages for the command line.
//!
//! Messages become objects of the form
//! `{"command": "12", "name": "Checkout Response", "fields": {...}}`.
//! Flags map to JSON booleans, counts to numbers, lists to arrays and
//! timestamps to `YYYY-MM-DD HH:MM:SS` strings.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use sip2_common::protocol::{datetime, FieldKind, Message, Value};

/// Display format for timestamps.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct MessageView<'a> {
    command: &'a str,
    name: &'a str,
    fields: Map<String, Json>,
}

/// Renders a message as a JSON object.
pub fn to_json(message: &Message) -> Json {
    let fields = message
        .fields()
        .map(|(name, value)| (name.to_string(), value_to_json(value)))
        .collect();
    let view = MessageView {
        command: message.command(),
        name: message.schema().label,
        fields,
    };
    serde_json::to_value(view).unwrap_or(Json::Null)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Text(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
        Value::List(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
    }
}

/// Builds a message from a command code and a JSON object of field values.
///
/// A `transaction_date` the schema defines but the object omits is set to
/// the current time. Timestamps also accept the string `"now"`.
pub fn from_json(command: &str, fields: &Json) -> Result<Message> {
    let mut message = Message::for_command(command)?;
    let object = fields
        .as_object()
        .ok_or_else(|| anyhow!("fields must be a JSON object"))?;

    for (name, json) in object {
        let (name, kind) = message
            .schema()
            .field(name)
            .ok_or_else(|| anyhow!("message {} has no field '{}'", command, name))?;
        let value = json_to_value(kind, json).with_context(|| format!("field '{}'", name))?;
        message.set(name, value)?;
    }

    if message.schema().field("transaction_date").is_some() && !message.is_set("transaction_date") {
        message.set("transaction_date", datetime::now())?;
    }

    Ok(message)
}

/// Parses the `--fields` argument.
pub fn parse_fields(text: &str) -> Result<Json> {
    serde_json::from_str(text).map_err(|e| anyhow!("Invalid JSON in fields: {}", e))
}

fn json_to_value(kind: FieldKind, json: &Json) -> Result<Value> {
    let value = match (kind, json) {
        (FieldKind::Bool(_), Json::Bool(b)) => Value::Bool(*b),
        (FieldKind::Int, Json::Number(n)) => {
            let n = n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| anyhow!("{} is not a valid count", n))?;
            Value::Int(n)
        }
        (FieldKind::Text, Json::String(s)) => Value::Text(s.clone()),
        (FieldKind::Date, Json::String(s)) => Value::Date(parse_date(s)?),
        (FieldKind::List, Json::Array(items)) => Value::List(
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow!("list entries must be strings"))
                })
                .collect::<Result<_>>()?,
        ),
        (kind, other) => bail!("expected a {} value, got {}", kind, other),
    };
    Ok(value)
}

fn parse_date(text: &str) -> Result<NaiveDateTime> {
    if text == "now" {
        return Ok(datetime::now());
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(text, DATE_FORMAT) {
        return Ok(date);
    }
    match datetime::parse(text) {
        Ok(Some(date)) => Ok(date),
        _ => bail!("'{}' is not a timestamp (use {} or \"now\")", text, DATE_FORMAT),
    }
}
