//! Authoritative lookups over a request/response channel
//!
//! The transport that frames and ships the lookup to the name service lives
//! on the other end of the channel. It receives one [`AuthorityRequest`] per
//! lookup and answers through the enclosed reply sender.

use super::{AuthorityAnswer, AuthoritativeLookup};
use crate::config::ResolverConfig;
use crate::identity::{NameKey, PlayerId, PlayerName};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// A name lookup handed to the transport
#[derive(Debug)]
pub struct AuthorityRequest {
    pub name: NameKey,
    pub reply: oneshot::Sender<AuthorityResponse>,
}

/// Reply from the name service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityResponse {
    Found { id: PlayerId, name: PlayerName },
    Unknown,
}

/// [`AuthoritativeLookup`] backed by an `mpsc` request channel
#[derive(Debug, Clone)]
pub struct ChannelAuthority {
    requests: mpsc::Sender<AuthorityRequest>,
    timeout: Duration,
}

impl ChannelAuthority {
    pub fn new(requests: mpsc::Sender<AuthorityRequest>, timeout: Duration) -> Self {
        Self { requests, timeout }
    }

    /// Authority bounded by the configured `authority_timeout`
    pub fn from_config(requests: mpsc::Sender<AuthorityRequest>, config: &ResolverConfig) -> Self {
        Self::new(requests, config.authority_timeout)
    }

    /// Create an authority together with the receiving end for the transport
    pub fn channel(buffer: usize, timeout: Duration) -> (Self, mpsc::Receiver<AuthorityRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx, timeout), rx)
    }

    async fn round_trip(&self, name: &NameKey) -> Option<AuthorityResponse> {
        let (reply, response) = oneshot::channel();
        let request = AuthorityRequest {
            name: name.clone(),
            reply,
        };

        if self.requests.send(request).await.is_err() {
            debug!(name = %name, "Authority channel closed");
            return None;
        }

        match response.await {
            Ok(response) => Some(response),
            Err(_) => {
                debug!(name = %name, "Authority dropped lookup without replying");
                None
            }
        }
    }
}

#[async_trait]
impl AuthoritativeLookup for ChannelAuthority {
    async fn lookup(&self, name: &NameKey) -> Option<AuthorityAnswer> {
        match tokio::time::timeout(self.timeout, self.round_trip(name)).await {
            Ok(Some(AuthorityResponse::Found { id, name })) => Some(AuthorityAnswer { id, name }),
            Ok(Some(AuthorityResponse::Unknown)) | Ok(None) => None,
            Err(_) => {
                warn!(name = %name, timeout = ?self.timeout, "Authority lookup timed out");
                None
            }
        }
    }
}
