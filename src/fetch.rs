use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Stand-in for the chat platform's media API.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch `url` and hand back the raw response, whatever its status.
    async fn fetch(&self, url: &str) -> Result<reqwest::Response>;
}

pub struct HttpFileFetcher {
    client: reqwest::Client,
}

impl HttpFileFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        debug!("Fetching file: {}", url);

        // Transport errors go back to the handler as-is.
        let response = self.client.get(url).send().await?;

        debug!("File fetch {} returned {}", url, response.status());
        Ok(response)
    }
}
