pub mod catalog;
pub mod checksum;
pub mod datetime;
pub mod error;
pub mod flags;
pub mod message;
pub mod schema;
pub mod sequence;


pub use error::{Result, Sip2Error};
pub use flags::SupportedMessages;
pub use message::{Message, Value};
pub use schema::{BoolStyle, FieldKind, FieldPolicy, MessageSchema, PositionalField, TaggedField};
pub use sequence::{SequenceCheck, SequenceCounter, SequenceTracker};
