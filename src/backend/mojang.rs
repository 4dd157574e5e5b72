//! Public profile API client
//!
//! `GET {session}/session/minecraft/profile/<dashless id>` answers 204 for an
//! unknown id; `GET {services}/minecraft/profile/lookup/name/<name>` answers
//! 404 for an unknown name. Both share one body decoder.

use super::{Profile, ProfileApi};
use crate::config::ResolverConfig;
use crate::error::BackendError;
use crate::identity::PlayerId;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// Error body returned by the profile API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error: String,
    error_message: String,
    #[serde(default)]
    cause: Option<String>,
}

/// HTTP client for the public profile API.
///
/// Direct and unmanaged: no caching or coalescing happens here.
#[derive(Clone)]
pub struct MojangProfileClient {
    http_client: reqwest::Client,
    session_host: String,
    services_host: String,
}

impl MojangProfileClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http_client,
            session_host: config.session_host.trim_end_matches('/').to_string(),
            services_host: config.services_host.trim_end_matches('/').to_string(),
        })
    }

    fn profile_url(&self, id: PlayerId) -> String {
        format!(
            "{}/session/minecraft/profile/{}",
            self.session_host,
            id.dashless()
        )
    }

    fn lookup_url(&self, name: &str) -> String {
        format!(
            "{}/minecraft/profile/lookup/name/{}",
            self.services_host,
            urlencoding::encode(name)
        )
    }

    async fn fetch(&self, url: &str, absent: StatusCode) -> Result<Option<Profile>, BackendError> {
        debug!("Profile API GET: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == absent {
            return Ok(None);
        }

        let body = response.text().await.map_err(map_request_error)?;
        decode_profile(status, &body).map(Some)
    }
}

#[async_trait]
impl ProfileApi for MojangProfileClient {
    async fn profile_by_id(&self, id: PlayerId) -> Result<Option<Profile>, BackendError> {
        self.fetch(&self.profile_url(id), StatusCode::NO_CONTENT).await
    }

    async fn profile_by_name(&self, name: &str) -> Result<Option<Profile>, BackendError> {
        self.fetch(&self.lookup_url(name), StatusCode::NOT_FOUND).await
    }
}

fn map_request_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Http(e)
    }
}

/// Decode a profile body, falling back to the API's error body
fn decode_profile(status: StatusCode, body: &str) -> Result<Profile, BackendError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BackendError::RateLimited);
    }

    match serde_json::from_str::<Profile>(body) {
        Ok(profile) => Ok(profile),
        Err(_) => match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(err) => Err(BackendError::Api {
                error: err.error,
                message: err.error_message,
                cause: err.cause,
            }),
            Err(_) => Err(BackendError::Malformed {
                status: status.as_u16(),
                body: body.to_string(),
            }),
        },
    }
}
