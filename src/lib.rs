//! Player identity resolution
//!
//! Resolves player ids to display names and back for clients that ask both
//! questions constantly. Lookups are coalesced per key, both directions are
//! kept mirrored, and names are resolved through a tiered backend: an
//! authoritative name service first, the public profile API as fallback.
//!
//! ```no_run
//! use player_identity::{IdentityCache, MojangProfileClient, ResolverConfig, TieredResolver};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ResolverConfig::from_env()?;
//! let profiles = Arc::new(MojangProfileClient::new(&config)?);
//! let cache = IdentityCache::new(TieredResolver::profile_only(profiles));
//!
//! let id = cache.resolve_id("Notch").await?;
//! let name = cache.resolve_name(id).await?;
//! assert_eq!(name.as_str(), "Notch");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;

pub use backend::{
    AuthoritativeLookup, AuthorityAnswer, ChannelAuthority, MojangProfileClient, NoAuthority,
    Profile, ProfileApi,
};
pub use cache::Resolution;
pub use config::ResolverConfig;
pub use error::{BackendError, ConfigError, LookupResult, ResolveError};
pub use identity::{IdentityCache, NameKey, ObservableName, PlayerId, PlayerName, TieredResolver};
