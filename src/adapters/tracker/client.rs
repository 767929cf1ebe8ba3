//! HTTP implementation of the tracker API
//!
//! Talks to the `/api` web API of a tracker server with reqwest. Requests
//! are sent once; there is no retry loop and no timeout unless
//! `server.timeout_seconds` is configured.

use super::api::{EntityEndpoint, EntityQuery, EventQuery, TrackerApi};
use super::models::{
    clean_record, ListPage, ENROLLMENTS_KEY, EVENTS_KEY, TRACKED_ENTITY_INSTANCES_KEY,
};
use crate::config::{AuthType, ServerConfig};
use crate::domain::ids::Uid;
use crate::domain::{
    Enrollment, Event, FerryError, Result, TrackedEntityInstance, UpstreamError,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Upper bound on pages walked by one list query
const MAX_PAGES: u32 = 100_000;

/// Tracker API client over HTTP
///
/// # Example
///
/// ```no_run
/// use ferry::adapters::tracker::TrackerClient;
/// use ferry::config::ServerConfig;
///
/// # async fn example() -> ferry::domain::Result<()> {
/// let client = TrackerClient::new(ServerConfig::default())?;
/// client.health_check().await?;
/// # Ok(())
/// # }
/// ```
pub struct TrackerClient {
    /// Base URL of the server, without trailing slash
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    /// Server configuration
    config: ServerConfig,
}

impl TrackerClient {
    /// Create a new client from the server configuration
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Configuration`] if the HTTP client can't be built.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(secs) = config.timeout_seconds {
            client_builder = client_builder.timeout(Duration::from_secs(secs));
        }

        if !config.tls_verify {
            tracing::warn!(
                base_url = %base_url,
                "TLS certificate verification is disabled for the tracker server"
            );
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            FerryError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// Verify the server is reachable and accepts our credentials
    ///
    /// # Errors
    ///
    /// Returns the upstream error of the system info request.
    pub async fn health_check(&self) -> Result<()> {
        let url = self.api_url("system/info.json");
        match self.get_json(&url, &[]).await {
            Ok(_) => {
                tracing::info!(base_url = %self.base_url, "Tracker server health check passed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    base_url = %self.base_url,
                    error = %e,
                    "Tracker server health check failed"
                );
                Err(e)
            }
        }
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        match self.config.auth_type {
            AuthType::Token => self
                .config
                .api_token
                .as_ref()
                .map(|token| format!("ApiToken {}", token.expose_secret())),
            AuthType::Basic => match (&self.config.username, &self.config.password) {
                (Some(username), Some(password)) => {
                    let credentials = format!("{username}:{}", password.expose_secret());
                    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                    Some(format!("Basic {encoded}"))
                }
                _ => None,
            },
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Issue one GET and decode the body as JSON
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        tracing::debug!(url = %url, params = ?params, "GET");

        let mut request = self.client.get(url).query(params);
        if let Some(auth) = self.auth_header_value() {
            request = request.header("Authorization", auth);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| UpstreamError::ConnectionFailed(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            }
            .into());
        }

        resp.json::<Value>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("{url}: {e}")).into())
    }

    /// Run a list query, walking pages when a page size is configured
    async fn list<R>(
        &self,
        resource: &str,
        collection_key: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<R>>
    where
        R: From<Map<String, Value>>,
    {
        let url = self.api_url(resource);

        let Some(page_size) = self.config.page_size else {
            let mut params = params;
            params.push(("skipPaging", "true".to_string()));
            let body = self.get_json(&url, &params).await?;
            let page = ListPage::from_body(body, collection_key)?;
            return Ok(page.records.into_iter().map(R::from).collect());
        };

        let mut records = Vec::new();
        let mut page_number: u32 = 1;
        loop {
            let mut page_params = params.clone();
            page_params.push(("page", page_number.to_string()));
            page_params.push(("pageSize", page_size.to_string()));
            page_params.push(("totalPages", "true".to_string()));

            let body = self.get_json(&url, &page_params).await?;
            let page = ListPage::from_body(body, collection_key)?;
            if page.is_stale(page_number) {
                tracing::warn!(
                    url = %url,
                    page = page_number,
                    "Server repeated an earlier page, stopping"
                );
                break;
            }
            let has_more = page.has_more(page_number, page_size);
            if has_more && page_number >= MAX_PAGES {
                return Err(UpstreamError::InvalidResponse(format!(
                    "{url}: more than {MAX_PAGES} pages of {page_size} records"
                ))
                .into());
            }

            tracing::debug!(
                url = %url,
                page = page_number,
                count = page.records.len(),
                "Fetched page"
            );

            records.extend(page.records.into_iter().map(R::from));
            if !has_more {
                break;
            }
            page_number += 1;
        }

        Ok(records)
    }

    /// URL of one record, with the id percent-encoded as a single path segment
    fn record_url(&self, collection: &str, uid: &Uid) -> Result<String> {
        let mut url = Url::parse(&self.api_url(collection)).map_err(|e| {
            FerryError::Configuration(format!("Invalid server URL {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FerryError::Configuration(format!(
                    "Server URL {} cannot hold a path",
                    self.base_url
                ))
            })?
            .push(&format!("{uid}.json"));
        Ok(url.into())
    }

    /// Fetch a single record
    async fn get_record<R>(&self, collection: &str, uid: &Uid) -> Result<R>
    where
        R: From<Map<String, Value>>,
    {
        let url = self.record_url(collection, uid)?;
        let body = self.get_json(&url, &[]).await?;
        Ok(R::from(clean_record(body)?))
    }
}

#[async_trait]
impl TrackerApi for TrackerClient {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        self.list("events.json", EVENTS_KEY, query.to_params()).await
    }

    async fn query_tracked_entity_instances(
        &self,
        query: &EntityQuery,
    ) -> Result<Vec<TrackedEntityInstance>> {
        self.list(
            "trackedEntityInstances.json",
            TRACKED_ENTITY_INSTANCES_KEY,
            query.to_params(EntityEndpoint::TrackedEntityInstances),
        )
        .await
    }

    async fn query_enrollments(&self, query: &EntityQuery) -> Result<Vec<Enrollment>> {
        self.list(
            "enrollments.json",
            ENROLLMENTS_KEY,
            query.to_params(EntityEndpoint::Enrollments),
        )
        .await
    }

    async fn get_tracked_entity_instance(&self, uid: &Uid) -> Result<TrackedEntityInstance> {
        self.get_record("trackedEntityInstances", uid).await
    }

    async fn get_enrollment(&self, uid: &Uid) -> Result<Enrollment> {
        self.get_record("enrollments", uid).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = ServerConfig {
            base_url: "https://play.example.org/dhis/".to_string(),
            ..Default::default()
        };
        let client = TrackerClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://play.example.org/dhis");
        assert_eq!(
            client.api_url("events.json"),
            "https://play.example.org/dhis/api/events.json"
        );
    }

    #[test]
    fn test_basic_auth_header() {
        let config = ServerConfig {
            username: Some("admin".to_string()),
            password: Some(secret_string("district".to_string())),
            ..Default::default()
        };
        let client = TrackerClient::new(config).unwrap();
        assert_eq!(
            client.auth_header_value(),
            Some("Basic YWRtaW46ZGlzdHJpY3Q=".to_string())
        );
    }

    #[test]
    fn test_token_auth_header() {
        let config = ServerConfig {
            auth_type: AuthType::Token,
            api_token: Some(secret_string("d2pat_abc".to_string())),
            ..Default::default()
        };
        let client = TrackerClient::new(config).unwrap();
        assert_eq!(
            client.auth_header_value(),
            Some("ApiToken d2pat_abc".to_string())
        );
    }

    #[test]
    fn test_record_url_encodes_id() {
        let config = ServerConfig {
            base_url: "https://play.example.org/dhis".to_string(),
            ..Default::default()
        };
        let client = TrackerClient::new(config).unwrap();
        assert_eq!(
            client.record_url("enrollments", &Uid::from("en1")).unwrap(),
            "https://play.example.org/dhis/api/enrollments/en1.json"
        );
        assert_eq!(
            client
                .record_url("enrollments", &Uid::from("en1?x=/y#z"))
                .unwrap(),
            "https://play.example.org/dhis/api/enrollments/en1%3Fx=%2Fy%23z.json"
        );
    }

    #[test]
    fn test_no_credentials_no_header() {
        let client = TrackerClient::new(ServerConfig::default()).unwrap();
        assert_eq!(client.auth_header_value(), None);
    }
}
