use std::sync::Arc;

use async_trait::async_trait;
use sip2_common::protocol::error::Result;
use sip2_common::protocol::Message;

/// Business logic behind an ACS.
///
/// A session decodes each request and hands it to the driver, which returns
/// the response message. The response must be of the type the request's
/// schema names; the session drops anything else. A single driver serves
/// every session of a daemon concurrently.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn handle(&self, request: &Message) -> Result<Message>;
}

#[async_trait]
impl<D: Driver + ?Sized> Driver for Arc<D> {
    async fn handle(&self, request: &Message) -> Result<Message> {
        (**self).handle(request).await
    }
}
