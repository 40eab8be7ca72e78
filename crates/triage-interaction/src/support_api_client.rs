//! SupportApiClient - REST client for the support backend.
//!
//! One client serves both collaborators of the conversation: the issue
//! catalog (`CatalogClient`) and the turn endpoints (`SupportGateway`).
//! Timeouts are enforced here; the conversation itself never times out.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use triage_core::catalog::{CatalogClient, Category, CategoryList, SubIssue, SubIssueList};
use triage_core::config::{ApiConfig, DEFAULT_TIMEOUT_SECS};
use triage_core::gateway::{
    ChatTurnReply, ChatTurnRequest, ImageTurnRequest, MissingItemsReply, MissingItemsRequest,
    SupportGateway, TurnReply,
};
use triage_core::{Result, TriageError};

/// Client implementation that talks to the support HTTP API.
#[derive(Clone)]
pub struct SupportApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl SupportApiClient {
    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Config` if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| TriageError::config(format!("Invalid base URL '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TriageError::config(format!(
                "Base URL '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Creates a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(&config.base_url)?
            .with_timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TriageError::config("Base URL cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(target: "support_api", %url, "GET");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        read_json(response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(target: "support_api", %url, "POST");
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        read_json(response).await
    }
}

#[async_trait]
impl CatalogClient for SupportApiClient {
    async fn categories(&self, service: &str, user_type: &str) -> Result<Vec<Category>> {
        let url = self.endpoint(&["api", "categories", service, user_type])?;
        let list: CategoryList = self.get_json(url).await?;
        Ok(list.categories)
    }

    async fn sub_issues(
        &self,
        service: &str,
        user_type: &str,
        category_id: &str,
    ) -> Result<Vec<SubIssue>> {
        let url = self.endpoint(&["api", "subissues", service, user_type, category_id])?;
        let list: SubIssueList = self.get_json(url).await?;
        Ok(list.subissues)
    }
}

#[async_trait]
impl SupportGateway for SupportApiClient {
    async fn chat_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnReply> {
        let url = self.endpoint(&["api", "chat"])?;
        self.post_json(url, &request).await
    }

    async fn image_turn(&self, request: ImageTurnRequest) -> Result<TurnReply> {
        let url = self.endpoint(&["api", "chat", "image"])?;
        self.post_json(url, &request).await
    }

    async fn missing_items_turn(&self, request: MissingItemsRequest) -> Result<MissingItemsReply> {
        let url = self.endpoint(&["api", "missing-items"])?;
        self.post_json(url, &request).await
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        return Err(map_http_error(status, &body_text));
    }

    let body = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&body).map_err(TriageError::from)
}

fn map_transport_error(err: reqwest::Error) -> TriageError {
    TriageError::transport(
        format!("Support API request failed: {err}"),
        err.is_connect() || err.is_timeout(),
    )
}

fn map_http_error(status: StatusCode, body: &str) -> TriageError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error)
        .unwrap_or_else(|_| body.trim().to_string());

    tracing::warn!(target: "support_api", status = status.as_u16(), "Support API returned an error");
    TriageError::upstream(status.as_u16(), message)
}
