use super::client::HttpClient;
use async_trait::async_trait;
use std::time::Duration;

/// Connect timeout applied alongside any request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    /// Builds a client whose requests give up after `timeout`.
    ///
    /// Keep `timeout` below the poll interval so a hung request resolves
    /// (as a failure) before the next one is due.
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
