use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;
use crate::protocol::{catalog, FieldKind, Message, MessageSchema, Sip2Error, Value};

fn sample_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn checkout_request() -> Message {
    let mut message = Message::new(&catalog::CHECKOUT);
    message
        .set("sc_renewal_policy", true)
        .unwrap()
        .set("transaction_date", sample_date())
        .unwrap()
        .set("patron_identifier", "2000000")
        .unwrap()
        .set("item_identifier", "300000000")
        .unwrap();
    message
}

/// Sets every field of a schema to a value of the right kind.
fn filled(schema: &'static MessageSchema) -> Message {
    let mut message = Message::new(schema);
    for field in schema.positional {
        let value = match field.kind {
            FieldKind::Bool(_) => Value::Bool(true),
            FieldKind::Date => Value::Date(sample_date()),
            FieldKind::Int => Value::Int(7),
            FieldKind::Text => Value::Text("X".repeat(field.width)),
            FieldKind::List => unreachable!("positional list"),
        };
        message.set(field.name, value).unwrap();
    }
    for field in schema.tagged {
        let value = match field.kind {
            FieldKind::Bool(_) => Value::Bool(false),
            FieldKind::Date => Value::Date(sample_date()),
            FieldKind::Int => Value::Int(42),
            FieldKind::Text => Value::Text(format!("value of {}", field.name)),
            FieldKind::List => Value::List(vec!["first".to_string(), "second".to_string()]),
        };
        message.set(field.name, value).unwrap();
    }
    message
}

#[test]
fn test_encode_checkout() {
    let line = Codec::new(ErrorDetection::FULL)
        .encode(&checkout_request(), Some(0))
        .unwrap();
    assert_eq!(
        line,
        "11YN20240115    103000                  AA2000000|AB300000000|AY0AZF31D"
    );
}

#[test]
fn test_encode_without_error_detection() {
    let line = Codec::new(ErrorDetection::OFF)
        .encode(&checkout_request(), None)
        .unwrap();
    assert_eq!(
        line,
        "11YN20240115    103000                  AA2000000|AB300000000|"
    );
}

#[test]
fn test_encode_login() {
    let login = Message::new(&catalog::LOGIN)
        .with("login_user_id", "user")
        .unwrap()
        .with("login_password", "pass")
        .unwrap();
    let line = Codec::new(ErrorDetection::FULL).encode(&login, Some(2)).unwrap();
    assert_eq!(line, "9300CNuser|COpass|AY2AZF83C");
}

#[test]
fn test_tags_written_in_ascending_order() {
    let mut message = checkout_request();
    message.set("institution_id", "MAIN").unwrap();
    message.set("fee_acknowledged", true).unwrap();
    let line = Codec::default().encode(&message, None).unwrap();

    let tagged = &line[40..];
    assert_eq!(tagged, "AA2000000|AB300000000|AOMAIN|BOY|");
}

#[test]
fn test_round_trip_every_schema() {
    for mode in [ErrorDetection::OFF, ErrorDetection::FULL] {
        let codec = Codec::new(mode);
        for schema in catalog::ALL {
            let message = filled(schema);
            let line = codec.encode(&message, Some(3)).unwrap();
            let frame = codec
                .decode(&line)
                .unwrap_or_else(|e| panic!("{}: {} ({})", schema.label, e, line));
            assert_eq!(frame.message, message, "{}", schema.label);
            assert_eq!(frame.sequence, Some(3));
        }
    }
}

#[test]
fn test_missing_required_tag_fails_encode() {
    let mut message = checkout_request();
    message.unset("patron_identifier");
    let err = Codec::default().encode(&message, None).unwrap_err();
    assert!(matches!(
        err,
        Sip2Error::MandatoryFieldOmitted { command: "11", field: "patron_identifier" }
    ));
}

#[test]
fn test_missing_positional_without_default_fails_encode() {
    let mut message = checkout_request();
    message.unset("transaction_date");
    let err = Codec::default().encode(&message, None).unwrap_err();
    assert!(matches!(
        err,
        Sip2Error::MandatoryFieldOmitted { field: "transaction_date", .. }
    ));
}

#[test]
fn test_positional_text_must_fill_width() {
    let mut message = Message::new(&catalog::PATRON_STATUS_REQUEST);
    message
        .set("language", "EN")
        .unwrap()
        .set("transaction_date", sample_date())
        .unwrap()
        .set("patron_identifier", "P")
        .unwrap();
    let err = Codec::default().encode(&message, None).unwrap_err();
    assert!(matches!(
        err,
        Sip2Error::InvalidFieldLength { expected: 3, actual: 2, .. }
    ));
}

#[test]
fn test_positional_int_overflow() {
    let mut message = filled(&catalog::ACS_STATUS);
    message.set("timeout_period", 1000u32).unwrap();
    let err = Codec::default().encode(&message, None).unwrap_err();
    assert!(matches!(err, Sip2Error::InvalidFieldLength { expected: 3, .. }));
}

#[test]
fn test_tagged_value_limits() {
    let mut message = checkout_request();
    message.set("patron_identifier", "x".repeat(256)).unwrap();
    assert!(matches!(
        Codec::default().encode(&message, None),
        Err(Sip2Error::InvalidFieldLength { expected: 255, actual: 256, .. })
    ));

    message.set("patron_identifier", "x".repeat(255)).unwrap();
    assert!(Codec::default().encode(&message, None).is_ok());

    message.set("patron_identifier", "a|b").unwrap();
    assert!(matches!(
        Codec::default().encode(&message, None),
        Err(Sip2Error::InvalidFieldValue { .. })
    ));

    message.set("patron_identifier", "a\rb").unwrap();
    assert!(matches!(
        Codec::default().encode(&message, None),
        Err(Sip2Error::InvalidFieldValue { .. })
    ));
}

#[test]
fn test_decode_checkout_response() {
    let line = "120NUN20240115    103000AA2000000|AB300000000|AH|AJ|AO|AY1AZF1C9";
    let frame = Codec::new(ErrorDetection::FULL).decode(line).unwrap();
    let message = frame.message;

    assert_eq!(frame.sequence, Some(1));
    assert_eq!(message.command(), "12");
    assert_eq!(message.flag("ok"), Some(false));
    assert_eq!(message.flag("renewal_ok"), Some(false));
    assert_eq!(message.text("magnetic_media"), Some("U"));
    assert_eq!(message.flag("desensitize"), Some(false));
    assert_eq!(message.date("transaction_date"), Some(sample_date()));
    assert_eq!(message.text("patron_identifier"), Some("2000000"));
    assert_eq!(message.text("item_identifier"), Some("300000000"));
    assert_eq!(message.text("due_date"), Some(""));
    assert_eq!(message.text("institution_id"), Some(""));
}

#[test]
fn test_decode_tolerates_terminator() {
    let frame = Codec::default().decode("9300CNuser|COpass|\r\n").unwrap();
    assert_eq!(frame.message.text("login_password"), Some("pass"));
    assert_eq!(frame.sequence, None);
}

#[test]
fn test_decode_unknown_command() {
    assert!(matches!(
        Codec::default().decode("XX123"),
        Err(Sip2Error::MessageNotUnderstood(_))
    ));
    assert!(matches!(
        Codec::default().decode("9"),
        Err(Sip2Error::MessageNotUnderstood(_))
    ));
}

#[test]
fn test_decode_truncated_positional_section() {
    let err = Codec::default().decode("11YN2024").unwrap_err();
    assert!(matches!(err, Sip2Error::InvalidFieldLength { expected: 38, actual: 6, .. }));
}

#[test]
fn test_decode_rejects_bad_checksum() {
    let line = "9300CNuser|COpass|AY2AZF83D";
    let err = Codec::new(ErrorDetection::FULL).decode(line).unwrap_err();
    assert!(matches!(err, Sip2Error::ChecksumError { calculated: 0xF83C, .. }));

    // Not enforced: the trailer is still stripped.
    let frame = Codec::new(ErrorDetection::OFF).decode(line).unwrap();
    assert_eq!(frame.message.text("login_password"), Some("pass"));
    assert_eq!(frame.sequence, Some(2));
}

#[test]
fn test_decode_accepts_lowercase_checksum() {
    let frame = Codec::new(ErrorDetection::FULL)
        .decode("9300CNuser|COpass|AY2AZf83c")
        .unwrap();
    assert_eq!(frame.message.text("login_user_id"), Some("user"));
}

#[test]
fn test_decode_requires_checksum_when_enforced() {
    let err = Codec::new(ErrorDetection::FULL)
        .decode("9300CNuser|COpass|AY2")
        .unwrap_err();
    assert!(matches!(err, Sip2Error::ChecksumError { .. }));
}

#[test]
fn test_decode_skips_unknown_tags() {
    let frame = Codec::default().decode("9300CNuser|ZZwhatever|COpass|").unwrap();
    assert_eq!(frame.message.text("login_user_id"), Some("user"));
    assert_eq!(frame.message.fields().count(), 4);
}

#[test]
fn test_decode_missing_required_tag() {
    let err = Codec::default().decode("9300COpass|").unwrap_err();
    assert!(matches!(
        err,
        Sip2Error::MandatoryFieldOmitted { field: "login_user_id", .. }
    ));
}

#[test]
fn test_decode_repeated_tags() {
    let line = format!(
        "64{}000{}{}AApatron|AEfirst|AEsecond|AUbook-1|AUbook-2|AUbook-3|",
        " ".repeat(14),
        "20240115    103000",
        " ".repeat(24),
    );
    let message = Codec::default().decode(&line).unwrap().message;

    assert_eq!(message.text("personal_name"), Some("second"));
    assert_eq!(
        message.list("charged_items").unwrap(),
        &["book-1", "book-2", "book-3"]
    );
    // Blank counts stay unset.
    assert_eq!(message.int("hold_items_count"), None);
}

#[test]
fn test_decode_invalid_values() {
    let bad_flag = "11XN20240115    103000                  AAp|ABi|";
    assert!(matches!(
        Codec::default().decode(bad_flag),
        Err(Sip2Error::InvalidFieldValue { .. })
    ));

    let bad_date = "11YN20241315    103000                  AAp|ABi|";
    assert!(matches!(
        Codec::default().decode(bad_date),
        Err(Sip2Error::InvalidFieldValue { .. })
    ));

    let bad_int = format!("63000{}{}AApatron|BPabc|", "20240115    103000", " ".repeat(10));
    assert!(matches!(
        Codec::default().decode(&bad_int),
        Err(Sip2Error::InvalidFieldValue { .. })
    ));
}

#[test]
fn test_detect_error_detection() {
    assert_eq!(
        ErrorDetection::detect("9900302.00AY1AZFCA5"),
        ErrorDetection::FULL
    );
    assert_eq!(
        ErrorDetection::detect("9900302.00AY1"),
        ErrorDetection::new(false, true)
    );
    assert_eq!(ErrorDetection::detect("9900302.00"), ErrorDetection::OFF);
    assert_eq!(
        ErrorDetection::OFF.union(ErrorDetection::new(true, false)),
        ErrorDetection::new(true, false)
    );
}

#[tokio::test]
async fn test_channel_splits_lines() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut channel = StreamChannel::new(client);

    server.write_all(b"first\rsecond\nthird\r\n\r\rfourth").await.unwrap();
    drop(server);

    assert_eq!(channel.read_line(None).await.unwrap().as_deref(), Some("first"));
    assert_eq!(channel.read_line(None).await.unwrap().as_deref(), Some("second"));
    assert_eq!(channel.read_line(None).await.unwrap().as_deref(), Some("third"));
    assert_eq!(channel.read_line(None).await.unwrap().as_deref(), Some("fourth"));
    assert_eq!(channel.read_line(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_channel_writes_carriage_return() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut channel = StreamChannel::new(client);

    channel.write_line("9900302.00").await.unwrap();
    channel.close().await.unwrap();
    channel.close().await.unwrap();

    let mut received = String::new();
    server.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "9900302.00\r");
    assert!(matches!(
        channel.write_line("again").await,
        Err(Sip2Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_channel_read_timeout_keeps_partial_line() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut channel = StreamChannel::new(client);

    server.write_all(b"99003").await.unwrap();
    let err = channel
        .read_line(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, Sip2Error::Timeout(50)));

    server.write_all(b"02.00\r").await.unwrap();
    let line = channel.read_line(Some(Duration::from_secs(1))).await.unwrap();
    assert_eq!(line.as_deref(), Some("9900302.00"));
}

#[tokio::test]
async fn test_channel_rejects_overlong_line() {
    let (client, mut server) = tokio::io::duplex(4096);
    let mut channel = StreamChannel::with_max_line_length(client, 16);

    server.write_all(&[b'x'; 64]).await.unwrap();
    let err = channel.read_line(None).await.unwrap_err();
    assert!(matches!(err, Sip2Error::Connection(_)));
}

#[tokio::test]
async fn test_channel_rejects_overlong_terminated_line() {
    let (client, mut server) = tokio::io::duplex(4096);
    let mut channel = StreamChannel::with_max_line_length(client, 16);

    let mut data = vec![b'x'; 64];
    data.extend_from_slice(b"\rok\r");
    server.write_all(&data).await.unwrap();

    let err = channel.read_line(None).await.unwrap_err();
    assert!(matches!(err, Sip2Error::Connection(_)));
    assert_eq!(channel.read_line(None).await.unwrap().as_deref(), Some("ok"));

    server.write_all(&[b'y'; 16]).await.unwrap();
    server.write_all(b"\r").await.unwrap();
    let line = channel.read_line(None).await.unwrap().unwrap();
    assert_eq!(line.len(), 16);
}
