//! Session behavior tests over an in-memory duplex pipe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sip2_common::protocol::{catalog, datetime, Message, Result, Sip2Error};
use sip2_common::transport::{Codec, ErrorDetection, LineChannel, StreamChannel};
use sip2_server::{DemoDriver, Driver, Session, SessionConfig};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

/// Demo driver that counts the requests it handles.
#[derive(Default)]
struct CountingDriver {
    inner: DemoDriver,
    calls: AtomicUsize,
}

impl CountingDriver {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for CountingDriver {
    async fn handle(&self, request: &Message) -> Result<Message> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.handle(request).await
    }
}

/// Driver that answers everything with a login response.
struct WrongTypeDriver;

#[async_trait]
impl Driver for WrongTypeDriver {
    async fn handle(&self, _request: &Message) -> Result<Message> {
        Message::new(&catalog::LOGIN_RESPONSE).with("ok", true)
    }
}

/// Driver that always fails, counting its calls.
#[derive(Default)]
struct FailingDriver {
    calls: AtomicUsize,
}

#[async_trait]
impl Driver for FailingDriver {
    async fn handle(&self, _request: &Message) -> Result<Message> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Sip2Error::Driver("backend unavailable".to_string()))
    }
}

fn start<D: Driver + 'static>(
    config: SessionConfig,
    driver: Arc<D>,
) -> (StreamChannel<DuplexStream>, JoinHandle<Result<()>>) {
    let (client, server) = tokio::io::duplex(8192);
    let session = Session::new(StreamChannel::new(server), driver, config).with_peer("test-sc");
    (StreamChannel::new(client), tokio::spawn(session.run()))
}

/// Writes a line and waits briefly for the reply.
async fn exchange(channel: &mut StreamChannel<DuplexStream>, line: &str) -> Option<String> {
    channel.write_line(line).await.unwrap();
    match channel.read_line(Some(Duration::from_millis(200))).await {
        Ok(reply) => reply,
        Err(Sip2Error::Timeout(_)) => None,
        Err(e) => panic!("read failed: {}", e),
    }
}

fn checkout(patron: &str) -> Message {
    Message::new(&catalog::CHECKOUT)
        .with("sc_renewal_policy", true)
        .unwrap()
        .with("transaction_date", datetime::now())
        .unwrap()
        .with("patron_identifier", patron)
        .unwrap()
        .with("item_identifier", "300000000")
        .unwrap()
}

fn strict() -> SessionConfig {
    SessionConfig::new()
        .with_strict_checksum(true)
        .with_strict_sequence(true)
}

#[tokio::test]
async fn test_status_negotiates_error_detection() {
    let (mut sc, session) = start(SessionConfig::default(), Arc::new(DemoDriver::new()));

    let reply = exchange(&mut sc, "9900302.00AY1AZFCA5").await.unwrap();
    assert!(reply.starts_with("98"), "{}", reply);
    let frame = Codec::new(ErrorDetection::FULL).decode(&reply).unwrap();
    assert_eq!(frame.sequence, Some(1));
    assert_eq!(frame.message.text("supported_messages"), Some("YYYYYYYYYYYYYYYY"));

    sc.close().await.unwrap();
    session.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_plain_status_gets_plain_response() {
    let (mut sc, _session) = start(SessionConfig::default(), Arc::new(DemoDriver::new()));

    let reply = exchange(&mut sc, "9900302.00").await.unwrap();
    assert!(reply.starts_with("98"));
    assert_eq!(ErrorDetection::detect(&reply), ErrorDetection::OFF);
}

#[tokio::test]
async fn test_forced_checksum_survives_plain_status() {
    let config = SessionConfig::new().with_strict_checksum(true);
    let (mut sc, _session) = start(config, Arc::new(DemoDriver::new()));

    // A plain line fails the forced checksum and is dropped.
    assert_eq!(exchange(&mut sc, "9900302.00").await, None);

    let reply = exchange(&mut sc, "9900302.00AY1AZFCA5").await.unwrap();
    assert!(ErrorDetection::detect(&reply).checksum);
}

#[tokio::test]
async fn test_corrupted_line_is_dropped() {
    let driver = Arc::new(CountingDriver::default());
    let (mut sc, _session) = start(SessionConfig::default(), driver.clone());
    exchange(&mut sc, "9900302.00AY0AZFCA6").await.unwrap();

    let codec = Codec::new(ErrorDetection::FULL);
    let mut line = codec.encode(&checkout("2000000"), Some(1)).unwrap();
    line.replace_range(line.len() - 4.., "0000");
    assert_eq!(exchange(&mut sc, &line).await, None);
    assert_eq!(driver.calls(), 1);

    let good = codec.encode(&checkout("2000000"), Some(1)).unwrap();
    let reply = exchange(&mut sc, &good).await.unwrap();
    assert!(reply.starts_with("12"));
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn test_unknown_command_gets_resend_request() {
    let (mut sc, _session) = start(SessionConfig::default(), Arc::new(DemoDriver::new()));

    assert_eq!(exchange(&mut sc, "XX123").await.as_deref(), Some("96"));
    // Missing required patron identifier.
    let line = format!("11YN{}{}ABitem|", "20240115    103000", " ".repeat(18));
    assert_eq!(exchange(&mut sc, &line).await.as_deref(), Some("96"));
}

#[tokio::test]
async fn test_acs_resend_repeats_last_response() {
    let driver = Arc::new(CountingDriver::default());
    let (mut sc, _session) = start(SessionConfig::default(), driver.clone());

    assert_eq!(exchange(&mut sc, "97").await, None);

    let first = exchange(&mut sc, "9900302.00").await.unwrap();
    let again = exchange(&mut sc, "97").await.unwrap();
    assert_eq!(first, again);
    assert_eq!(driver.calls(), 1);
}

#[tokio::test]
async fn test_retransmission_returns_cached_response() {
    let driver = Arc::new(CountingDriver::default());
    let (mut sc, _session) = start(strict(), driver.clone());
    let codec = Codec::new(ErrorDetection::FULL);

    let line = codec.encode(&checkout("2000000"), Some(0)).unwrap();
    let first = exchange(&mut sc, &line).await.unwrap();
    let repeated = exchange(&mut sc, &line).await.unwrap();
    assert_eq!(first, repeated);
    assert_eq!(driver.calls(), 1);

    let next = codec.encode(&checkout("2000001"), Some(1)).unwrap();
    let reply = exchange(&mut sc, &next).await.unwrap();
    assert!(reply.contains("AA2000001|"));
    assert!(reply.contains("AY1AZ"));
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn test_out_of_sequence_line_is_dropped() {
    let driver = Arc::new(CountingDriver::default());
    let (mut sc, _session) = start(strict(), driver.clone());
    let codec = Codec::new(ErrorDetection::FULL);

    exchange(&mut sc, &codec.encode(&checkout("2000000"), Some(0)).unwrap())
        .await
        .unwrap();
    assert_eq!(
        exchange(&mut sc, &codec.encode(&checkout("2000000"), Some(5)).unwrap()).await,
        None
    );
    assert_eq!(
        exchange(&mut sc, &codec.encode(&checkout("2000000"), None).unwrap()).await,
        None
    );
    assert!(exchange(&mut sc, &codec.encode(&checkout("2000000"), Some(1)).unwrap())
        .await
        .is_some());
    assert_eq!(driver.calls(), 2);
}

#[tokio::test]
async fn test_wrong_response_type_gets_resend_request() {
    let (mut sc, _session) = start(SessionConfig::default(), Arc::new(WrongTypeDriver));

    let line = Codec::default().encode(&checkout("2000000"), None).unwrap();
    assert_eq!(exchange(&mut sc, &line).await.as_deref(), Some("96"));

    // A login legitimately answers with 94.
    let reply = exchange(&mut sc, "9300CNuser|COpass|").await;
    assert_eq!(reply.as_deref(), Some("941"));
}

#[tokio::test]
async fn test_driver_failure_gets_resend_request() {
    let driver = Arc::new(FailingDriver::default());
    let (mut sc, session) = start(SessionConfig::default(), driver.clone());

    assert_eq!(exchange(&mut sc, "9900302.00").await.as_deref(), Some("96"));
    assert_eq!(exchange(&mut sc, "97").await.as_deref(), Some("96"));
    assert_eq!(driver.calls.load(Ordering::SeqCst), 1);

    sc.close().await.unwrap();
    session.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failed_request_is_not_dispatched_again() {
    let driver = Arc::new(FailingDriver::default());
    let (mut sc, _session) = start(strict(), driver.clone());
    let codec = Codec::new(ErrorDetection::FULL);

    let line = codec.encode(&checkout("2000000"), Some(0)).unwrap();
    let first = exchange(&mut sc, &line).await.unwrap();
    assert!(first.starts_with("96AZ"), "{}", first);
    assert!(codec.decode(&first).is_ok());

    let repeated = exchange(&mut sc, &line).await.unwrap();
    assert_eq!(first, repeated);
    assert_eq!(driver.calls.load(Ordering::SeqCst), 1);

    let next = codec.encode(&checkout("2000000"), Some(1)).unwrap();
    assert!(exchange(&mut sc, &next).await.unwrap().starts_with("96"));
    assert_eq!(driver.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_idle_timeout_closes_session() {
    let config = SessionConfig::new().with_idle_timeout(Some(Duration::from_millis(50)));
    let (mut sc, session) = start(config, Arc::new(DemoDriver::new()));

    tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(sc.read_line(Some(Duration::from_secs(1))).await.unwrap(), None);
}

#[tokio::test]
async fn test_session_reports_mode() {
    let (_sc, server) = tokio::io::duplex(64);
    let session = Session::new(
        StreamChannel::new(server),
        Arc::new(DemoDriver::new()),
        strict(),
    );
    assert_eq!(session.error_detection(), ErrorDetection::FULL);
}
