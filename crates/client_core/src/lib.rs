use std::sync::Arc;

use reqwest::{header::CONTENT_TYPE, Client};
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::Envelope;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

pub mod crm;
pub mod error;
pub mod token_store;
pub mod transport;
pub mod views;

pub use crm::SessionRestore;
pub use error::{ClientError, ClientResult};
pub use token_store::{MemoryTokenStore, SqliteTokenStore, TokenStore, TOKEN_KEY};

use transport::{build_request_url, encode_body, Verb, PLAIN_TEXT_CONTENT_TYPE};

/// Production endpoint of the CRM script backend.
pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbyxwN1BhctjCrZ4Sb5r-kJDdYZDUD8KhuFGONuzDoUKKthFqxZnkbovKe-XrvOYgBee0A/exec";

/// Session client for the CRM backend.
///
/// Owns the session token for the whole process: construct one instance and
/// share it by reference or `Arc`. Each call is a single request against the
/// fixed endpoint; failures are returned to the caller without retry.
pub struct ApiClient {
    http: Client,
    endpoint: Url,
    token: RwLock<Option<String>>,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Builds a client and picks up any token persisted by an earlier run.
    pub async fn new(endpoint: &str, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Self::new_with_http(Client::new(), endpoint, store).await
    }

    pub async fn new_with_http(
        http: Client,
        endpoint: &str,
        store: Arc<dyn TokenStore>,
    ) -> ClientResult<Self> {
        let endpoint = Url::parse(endpoint)?;
        let token = store.load().await.map_err(ClientError::Storage)?;
        Ok(Self {
            http,
            endpoint,
            token: RwLock::new(token),
            store,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replaces the session token and mirrors it to persistent storage:
    /// written when present, deleted when absent.
    pub async fn set_token(&self, token: Option<String>) -> ClientResult<()> {
        let mut guard = self.token.write().await;
        *guard = token.clone();
        let persisted = match token.as_deref() {
            Some(token) => self.store.save(token).await,
            None => self.store.clear().await,
        };
        persisted.map_err(ClientError::Storage)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(String, String)],
    ) -> ClientResult<T> {
        self.request(Verb::Get, route, params, None).await
    }

    pub async fn post<T, B>(&self, route: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(Verb::Post, body)?;
        self.request(Verb::Post, route, &[], body).await
    }

    /// Logical update: sent as POST with `_method: "PUT"` merged into `body`.
    pub async fn put<T, B>(&self, route: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(Verb::Put, body)?;
        self.request(Verb::Put, route, &[], body).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        verb: Verb,
        route: &str,
        params: &[(String, String)],
        body: Option<String>,
    ) -> ClientResult<T> {
        let result = self.send(verb, route, params, body).await;
        if let Err(err) = &result {
            warn!(route, verb = verb.as_str(), "api request failed: {err}");
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        verb: Verb,
        route: &str,
        params: &[(String, String)],
        body: Option<String>,
    ) -> ClientResult<T> {
        let token = self.token.read().await.clone();
        let url = build_request_url(&self.endpoint, route, token.as_deref(), params);
        debug!(
            route,
            verb = verb.as_str(),
            authenticated = token.is_some(),
            "api request"
        );

        let mut request = self
            .http
            .request(verb.wire_method(), url)
            .header(CONTENT_TYPE, PLAIN_TEXT_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus { status });
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("response is not an envelope: {e}")))?;
        Ok(envelope.into_data()?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
