use std::time::Duration;

use thiserror::Error;

/// Failure to obtain a status code from a target
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Checker trait for the request a checker task performs
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Request `url` and return the status code of the response
    async fn check(&self, url: &str) -> Result<u16, CheckError>;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    /// Build a checker; `timeout` of `None` lets requests run unbounded
    pub fn new(timeout: Option<Duration>) -> Result<Self, CheckError> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("webstatus/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self { client: builder.build()? })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, url: &str) -> Result<u16, CheckError> {
        let response = self.client.get(url).send().await?;

        // The body is never read; dropping the response discards it.
        Ok(response.status().as_u16())
    }
}
