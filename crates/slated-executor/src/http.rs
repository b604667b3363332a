use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{ExecutorError, Result};
use crate::Executor;

/// REST adapter for the board API.
///
/// Authentication is query-parameter style: `key` is the service-level API
/// key from config, `token` is the per-action caller credential.
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpExecutor {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<()> {
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(status, body = %message, "board API error");
            return Err(ExecutorError::Api { status, message });
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn post_comment(&self, target_id: &str, credential: &str, text: &str) -> Result<()> {
        let url = format!("{}/cards/{}/actions/comments", self.base_url, target_id);
        debug!(target_id, "posting comment");

        let resp = self
            .client
            .post(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", credential),
                ("text", text),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::check(resp).await
    }

    async fn set_complete(&self, target_id: &str, credential: &str, complete: bool) -> Result<()> {
        let url = format!("{}/cards/{}", self.base_url, target_id);
        debug!(target_id, complete, "setting completion flag");

        let complete = if complete { "true" } else { "false" };
        let resp = self
            .client
            .put(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", credential),
                ("dueComplete", complete),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::check(resp).await
    }
}
