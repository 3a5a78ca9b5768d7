use async_trait::async_trait;
use reqwest::{Client, Url};
use spot_oracle_common::FetchError;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Status and full body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP GET capability used by the source adapter
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET and reads the whole body before returning, giving up at `deadline`.
    async fn get(&self, url: &str, deadline: Instant) -> Result<RawResponse, FetchError>;
}

/// reqwest-backed transport shared by every exchange call
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Request(format!("build http client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, deadline: Instant) -> Result<RawResponse, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::Request(e.to_string()))?;

        let request = async {
            let response = self.client.get(url).send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Transport(format!("read body: {}", e)))?;

            debug!("HTTP {} with {} byte body", status, body.len());
            Ok::<_, FetchError>(RawResponse { status, body })
        };

        match timeout_at(deadline, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_builder() {
        FetchError::Request(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}
