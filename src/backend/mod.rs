//! Resolution backends
//!
//! The authoritative name service and the public profile API, seen through
//! the narrow traits the tiered resolver consumes.

pub mod channel;
pub mod mojang;

pub use channel::{AuthorityRequest, AuthorityResponse, ChannelAuthority};
pub use mojang::MojangProfileClient;

use crate::error::BackendError;
use crate::identity::{NameKey, PlayerId, PlayerName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Profile returned by the public profile API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: PlayerId,
    pub name: PlayerName,
    #[serde(default)]
    pub properties: Vec<ProfileProperty>,
}

impl Profile {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Look up a named property, e.g. `textures`
    pub fn property(&self, name: &str) -> Option<&ProfileProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Named profile property; `signature` is only present when requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Affirmative answer from the authoritative name service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityAnswer {
    pub id: PlayerId,
    /// Name as the service knows it, original casing
    pub name: PlayerName,
}

/// Public profile lookup API.
///
/// `Ok(None)` means the API affirmatively reported that no such profile exists.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn profile_by_id(&self, id: PlayerId) -> Result<Option<Profile>, BackendError>;

    async fn profile_by_name(&self, name: &str) -> Result<Option<Profile>, BackendError>;
}

/// Authoritative name -> id service.
///
/// `None` covers every "no affirmative answer" case: unknown name, timeout,
/// malformed response, or no connection.
#[async_trait]
pub trait AuthoritativeLookup: Send + Sync {
    async fn lookup(&self, name: &NameKey) -> Option<AuthorityAnswer>;
}

/// Authority that never answers; every name lookup falls through to the profile API
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthority;

#[async_trait]
impl AuthoritativeLookup for NoAuthority {
    async fn lookup(&self, _name: &NameKey) -> Option<AuthorityAnswer> {
        None
    }
}
