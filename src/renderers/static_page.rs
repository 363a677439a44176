//! Static rendering: fetch the raw markup over HTTP without running scripts.

use crate::error::Error;
use crate::extractors::dom::PageSnapshot;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Fetches pages with a shared, preconfigured HTTP client
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
}

impl StaticFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RenderBackend(format!("could not build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Download `url` and return its markup and final URL
    pub async fn fetch(&self, url: &str) -> Result<PageSnapshot, Error> {
        ::log::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Navigation(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_markup(content_type) {
                return Err(Error::Navigation(format!(
                    "{} is not a web page ({})",
                    url, content_type
                )));
            }
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| fetch_error(url, e))?;

        ::log::debug!("Fetched {} bytes from {}", html.len(), final_url);
        Ok(PageSnapshot::new(final_url, html))
    }
}

fn is_markup(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("html") || content_type.contains("xml")
}

fn fetch_error(url: &str, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Navigation(format!("timed out fetching {}", url))
    } else {
        Error::Navigation(format!("failed to fetch {}: {}", url, error))
    }
}
