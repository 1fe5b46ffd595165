//! A driver with no circulation backend.
//!
//! Answers every request with a well-formed response of the right type so
//! SC equipment and integrations can be exercised end to end. Circulation
//! transactions are refused; logins and status checks succeed.

use async_trait::async_trait;
use tracing::debug;

use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::protocol::{catalog, datetime, FieldKind, FieldPolicy, Message, SupportedMessages};

use crate::driver::Driver;

/// Text for positional fields that have no default, by field name.
const POSITIONAL_TEXT: &[(&str, &str)] = &[
    ("circulation_status", "01"),
    ("security_marker", "00"),
    ("fee_type", "01"),
    ("currency_type", "USD"),
    ("hold_mode", "*"),
];

/// Tagged text fields never filled in.
const SKIPPED_TAGS: &[&str] = &["print_line", "screen_message"];

#[derive(Debug, Clone)]
pub struct DemoDriver {
    institution_id: String,
    library_name: String,
    screen_message: Option<String>,
}

impl Default for DemoDriver {
    fn default() -> Self {
        Self {
            institution_id: String::new(),
            library_name: "SIP2 Demo Library".to_string(),
            screen_message: None,
        }
    }
}

impl DemoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_institution_id(mut self, institution_id: impl Into<String>) -> Self {
        self.institution_id = institution_id.into();
        self
    }

    pub fn with_library_name(mut self, library_name: impl Into<String>) -> Self {
        self.library_name = library_name.into();
        self
    }

    /// Adds an `AF` screen message to every response that carries one.
    pub fn with_screen_message(mut self, message: impl Into<String>) -> Self {
        self.screen_message = Some(message.into());
        self
    }

    fn acs_status(&self) -> Result<Message> {
        let mut status = Message::new(&catalog::ACS_STATUS);
        for flag in [
            "online_status",
            "checkin_ok",
            "checkout_ok",
            "acs_renewal_policy",
            "status_update_ok",
            "offline_ok",
        ] {
            status.set(flag, true)?;
        }
        status
            .set("timeout_period", 30u32)?
            .set("retries_allowed", 3u32)?
            .set("date_time_sync", datetime::now())?
            .set("protocol_version", "2.00")?
            .set("institution_id", self.institution_id.as_str())?
            .set("library_name", self.library_name.as_str())?
            .set("supported_messages", SupportedMessages::all().to_string())?;
        if let Some(text) = &self.screen_message {
            status.set("screen_message", text.as_str())?;
        }
        Ok(status)
    }

    /// Builds a neutral response: flags off, counts zero, identifiers echoed.
    ///
    /// Positional fields with a default keep it, except flags, which are
    /// always cleared.
    fn neutral_response(&self, request: &Message, command: &str) -> Result<Message> {
        let mut response = Message::for_command(command)?;
        let schema = response.schema();
        let now = datetime::now();

        for field in schema.positional {
            match field.kind {
                FieldKind::Bool(_) => {
                    response.set(field.name, false)?;
                }
                _ if field.default.is_some() => {}
                FieldKind::Date => {
                    response.set(field.name, now)?;
                }
                FieldKind::Int => {
                    response.set(field.name, 0u32)?;
                }
                FieldKind::Text => {
                    let text = POSITIONAL_TEXT
                        .iter()
                        .find(|(name, _)| *name == field.name)
                        .map(|(_, text)| text.to_string())
                        .unwrap_or_else(|| "0".repeat(field.width));
                    response.set(field.name, text)?;
                }
                FieldKind::List => {}
            }
        }

        for field in schema.tagged {
            if field.kind != FieldKind::Text
                || field.policy == FieldPolicy::NotRequired
                || SKIPPED_TAGS.contains(&field.name)
            {
                continue;
            }
            let value = match request.text(field.name) {
                Some(echo) => echo.to_string(),
                None if field.name == "institution_id" => self.institution_id.clone(),
                None => String::new(),
            };
            response.set(field.name, value)?;
        }

        if let Some(text) = &self.screen_message {
            if schema.tagged_field("screen_message").is_some() {
                response.set("screen_message", text.as_str())?;
            }
        }

        // Logins always succeed.
        if command == catalog::LOGIN_RESPONSE.command {
            response.set("ok", true)?;
        }

        Ok(response)
    }
}

#[async_trait]
impl Driver for DemoDriver {
    async fn handle(&self, request: &Message) -> Result<Message> {
        debug!("Demo driver handling {} request", request.command());

        if request.command() == catalog::SC_STATUS.command {
            return self.acs_status();
        }

        let command = request.schema().response.ok_or_else(|| {
            Sip2Error::Driver(format!("{} is not a request", request.schema().label))
        })?;
        self.neutral_response(request, command)
    }
}
