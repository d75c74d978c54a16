use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use wallarm_core::RuleRecord;

use crate::api::RulesApi;
use crate::auth::Credentials;
use crate::error::{ApiError, Result};
use crate::models::{
    ActionRead, ActionSummary, Envelope, HintCreate, HintCreated, HintDelete, HintRead,
    UserDetails,
};
use crate::retry::RetryPolicy;

pub const DEFAULT_API_HOST: &str = "https://api.wallarm.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WallarmClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    retry: RetryPolicy,
}

pub struct WallarmClientBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    retry: RetryPolicy,
    user_agent: String,
    timeout: Duration,
}

impl Default for WallarmClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_HOST.to_string(),
            credentials: None,
            retry: RetryPolicy::default(),
            user_agent: format!("wallarm-rs/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WallarmClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<WallarmClient> {
        let credentials = self.credentials.ok_or(ApiError::InvalidCredentials)?;
        let url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::invalid_host(&self.base_url, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::invalid_host(
                &self.base_url,
                "scheme must be http or https",
            ));
        }
        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()?;
        Ok(WallarmClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            credentials,
            retry: self.retry,
        })
    }
}

impl WallarmClient {
    pub fn builder() -> WallarmClientBuilder {
        WallarmClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        for (name, value) in self.credentials.headers() {
            req = req.header(name, value);
        }
        req.header("Accept", "application/json")
    }

    /// Send a request, retrying transport errors, 429 and 5xx answers.
    /// Returns the body of a 2xx answer.
    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let payload = body.map(serde_json::to_vec).transpose()?;
        let mut attempt = 0u32;

        loop {
            let mut req = self.request(method.clone(), &url);
            if let Some(payload) = &payload {
                req = req
                    .header("Content-Type", "application/json")
                    .body(payload.clone());
            }

            let can_retry = attempt < self.retry.max_retries;
            match req.send().await {
                Ok(resp) if can_retry && self.retry.should_retry_status(resp.status()) => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        %method,
                        path,
                        status = resp.status().as_u16(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request after server error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await?;
                    tracing::debug!(%method, path, status = status.as_u16(), "API response");
                    if status.is_success() {
                        return Ok(text);
                    }
                    return Err(ApiError::from_status(status.as_u16(), text));
                }
                Err(err) if can_retry => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        %method,
                        path,
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request after transport error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn post<B, T>(&self, operation: &'static str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.execute(Method::POST, path, Some(body)).await?;
        decode(operation, &text)
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| ApiError::decode(operation, e))
}

#[async_trait]
impl RulesApi for WallarmClient {
    async fn read_rules(&self, query: &HintRead) -> Result<Vec<RuleRecord>> {
        let envelope: Envelope<Option<Vec<RuleRecord>>> =
            self.post("hint read", "/v1/objects/hint", query).await?;
        Ok(envelope.body.unwrap_or_default())
    }

    async fn read_actions(&self, query: &ActionRead) -> Result<Vec<ActionSummary>> {
        let envelope: Envelope<Option<Vec<ActionSummary>>> =
            self.post("action read", "/v1/objects/action", query).await?;
        Ok(envelope.body.unwrap_or_default())
    }

    async fn create_rule(&self, body: &HintCreate) -> Result<RuleRecord> {
        let created: HintCreated = self
            .post("hint create", "/v1/objects/hint/create", body)
            .await?;
        tracing::info!(
            rule_id = created.body.id,
            action_id = created.body.action_id,
            rule_type = %created.body.rule_type,
            "rule created"
        );
        Ok(created.body)
    }

    async fn delete_rule(&self, client_id: i64, rule_id: i64) -> Result<()> {
        self.execute(
            Method::POST,
            "/v1/objects/hint/delete",
            Some(&HintDelete::new(client_id, rule_id)),
        )
        .await?;
        tracing::info!(client_id, rule_id, "rule deleted");
        Ok(())
    }

    async fn delete_action(&self, action_id: i64) -> Result<()> {
        self.execute::<()>(Method::DELETE, &format!("/v2/action/{action_id}"), None)
            .await?;
        tracing::info!(action_id, "action deleted");
        Ok(())
    }

    async fn user_details(&self) -> Result<UserDetails> {
        let envelope: Envelope<UserDetails> =
            self.post("user details", "/v1/user", &serde_json::json!({})).await?;
        Ok(envelope.body)
    }
}
