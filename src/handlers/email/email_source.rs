use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::AppError;

use super::models::{MessagesResponse, RawMessageRecord};

/// Anything that can hand over the current inbox.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(&self) -> Result<Vec<RawMessageRecord>, AppError>;
}

/// Client for the LocalStack SES message endpoint. One GET returns the
/// whole inbox; there is no paging and no retry.
pub struct SesApiSource {
    client: Client,
    url: String,
}

impl SesApiSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MessageSource for SesApiSource {
    async fn fetch_messages(&self) -> Result<Vec<RawMessageRecord>, AppError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body)?;

        debug!(url = %self.url, count = parsed.messages.len(), "Fetched messages");
        Ok(parsed.messages)
    }
}
