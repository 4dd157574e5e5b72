//! Tiered resolver - the per-direction order in which backends are asked
use crate::{
    backend::{AuthoritativeLookup, NoAuthority, ProfileApi},
    error::{LookupResult, ResolveError},
    identity::{NameKey, PlayerId, PlayerName},
    metrics,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Stateless resolution policy.
///
/// - id -> name: profile API by id only.
/// - name -> id: authoritative service first; any non-affirmative outcome
///   falls back to the profile API by name, whose answer is final.
#[derive(Clone)]
pub struct TieredResolver {
    authority: Arc<dyn AuthoritativeLookup>,
    profiles: Arc<dyn ProfileApi>,
}

impl TieredResolver {
    pub fn new(authority: Arc<dyn AuthoritativeLookup>, profiles: Arc<dyn ProfileApi>) -> Self {
        Self {
            authority,
            profiles,
        }
    }

    /// Resolver without an authoritative service
    pub fn profile_only(profiles: Arc<dyn ProfileApi>) -> Self {
        Self::new(Arc::new(NoAuthority), profiles)
    }

    /// Resolve the current display name of `id`
    pub async fn name_for_id(&self, id: PlayerId) -> LookupResult<PlayerName> {
        match self.profiles.profile_by_id(id).await {
            Ok(Some(profile)) if profile.id == id => {
                metrics::record_backend_call("profile_by_id", "found");
                Ok(profile.name)
            }
            Ok(Some(profile)) => {
                metrics::record_backend_call("profile_by_id", "error");
                warn!(%id, answered = %profile.id, "Profile API answered for a different id");
                Err(ResolveError::transport(
                    format!("name of {}", id),
                    format!("profile API answered for {}", profile.id),
                ))
            }
            Ok(None) => {
                metrics::record_backend_call("profile_by_id", "not_found");
                debug!(%id, "Profile API reports no such player");
                Err(ResolveError::not_found(id.to_string()))
            }
            Err(e) => {
                metrics::record_backend_call("profile_by_id", "error");
                warn!(%id, error = %e, "Profile lookup by id failed");
                Err(ResolveError::transport(format!("name of {}", id), e))
            }
        }
    }

    /// Resolve the id currently holding `name`, with the name as the backend spells it
    pub async fn id_for_name(&self, name: &NameKey) -> LookupResult<(PlayerId, PlayerName)> {
        match self.authority.lookup(name).await {
            Some(answer) if answer.name.key() == *name => {
                metrics::record_backend_call("authority", "found");
                return Ok((answer.id, answer.name));
            }
            Some(answer) => {
                metrics::record_backend_call("authority", "malformed");
                warn!(%name, answered = %answer.name, "Authority answered for a different name");
            }
            None => {
                metrics::record_backend_call("authority", "no_answer");
                debug!(%name, "No authoritative answer, falling back to profile API");
            }
        }

        match self.profiles.profile_by_name(name.as_str()).await {
            Ok(Some(profile)) if profile.name.key() == *name => {
                metrics::record_backend_call("profile_by_name", "found");
                Ok((profile.id, profile.name))
            }
            Ok(Some(profile)) => {
                metrics::record_backend_call("profile_by_name", "error");
                warn!(%name, answered = %profile.name, "Profile API answered for a different name");
                Err(ResolveError::transport(
                    format!("id of {}", name),
                    format!("profile API answered for {}", profile.name),
                ))
            }
            Ok(None) => {
                metrics::record_backend_call("profile_by_name", "not_found");
                debug!(%name, "Profile API reports no such player");
                Err(ResolveError::not_found(name.to_string()))
            }
            Err(e) => {
                metrics::record_backend_call("profile_by_name", "error");
                warn!(%name, error = %e, "Profile lookup by name failed");
                Err(ResolveError::transport(format!("id of {}", name), e))
            }
        }
    }
}
