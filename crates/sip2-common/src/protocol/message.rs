use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::protocol::catalog;
use crate::protocol::datetime;
use crate::protocol::error::{Result, Sip2Error};
use crate::protocol::schema::{FieldKind, MessageSchema};

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Date(NaiveDateTime),
    Text(String),
    Int(u32),
    List(Vec<String>),
}

impl Value {
    /// Returns whether this value can be stored in a field of `kind`.
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Value::Bool(_), FieldKind::Bool(_))
                | (Value::Date(_), FieldKind::Date)
                | (Value::Text(_), FieldKind::Text)
                | (Value::Int(_), FieldKind::Int)
                | (Value::List(_), FieldKind::List)
        )
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(datetime::truncate(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

/// One SIP2 message: a schema plus the values set on it.
///
/// Unset fields are simply absent. The codec fills positional defaults and
/// skips optional tags when encoding, and leaves blank wire values unset when
/// decoding.
///
/// # Example
///
/// ```
/// use sip2_common::protocol::{catalog, datetime, Message};
///
/// let mut checkout = Message::new(&catalog::CHECKOUT);
/// checkout
///     .set("sc_renewal_policy", true).unwrap()
///     .set("transaction_date", datetime::now()).unwrap()
///     .set("patron_identifier", "2000000").unwrap()
///     .set("item_identifier", "300000000").unwrap();
///
/// assert_eq!(checkout.text("patron_identifier"), Some("2000000"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    schema: &'static MessageSchema,
    fields: BTreeMap<&'static str, Value>,
}

impl Message {
    pub fn new(schema: &'static MessageSchema) -> Self {
        Self {
            schema,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an empty message for a command code.
    pub fn for_command(command: &str) -> Result<Self> {
        catalog::require(command).map(Self::new)
    }

    pub fn schema(&self) -> &'static MessageSchema {
        self.schema
    }

    pub fn command(&self) -> &'static str {
        self.schema.command
    }

    /// Sets a field, checking that it exists and that the value fits its kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let (name, kind) = self.resolve(name)?;
        let value = value.into();
        if !value.fits(kind) {
            return Err(Sip2Error::FieldType {
                field: name,
                expected: kind,
            });
        }
        self.fields.insert(name, value);
        Ok(self)
    }

    /// Consuming form of [`set`](Self::set) for building messages inline.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Appends an entry to a list field.
    pub fn push(&mut self, name: &str, item: impl Into<String>) -> Result<&mut Self> {
        let (name, kind) = self.resolve(name)?;
        if kind != FieldKind::List {
            return Err(Sip2Error::FieldType {
                field: name,
                expected: kind,
            });
        }
        self.push_item(name, item.into());
        Ok(self)
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.fields.get(name)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDateTime> {
        match self.fields.get(name)? {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<u32> {
        match self.fields.get(name)? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name)? {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Set fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: Value) {
        self.fields.insert(name, value);
    }

    pub(crate) fn push_item(&mut self, name: &'static str, item: String) {
        match self.fields.entry(name).or_insert_with(|| Value::List(Vec::new())) {
            Value::List(items) => items.push(item),
            other => *other = Value::List(vec![item]),
        }
    }

    fn resolve(&self, name: &str) -> Result<(&'static str, FieldKind)> {
        self.schema.field(name).ok_or_else(|| Sip2Error::UnknownField {
            command: self.schema.command,
            field: name.to_string(),
        })
    }
}
