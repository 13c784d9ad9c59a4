//! Remote proxy range feed.
//!
//! Each feed URL returns newline-separated IP or CIDR literals
//! (e.g. `https://www.cloudflare.com/ips-v4`).

use std::time::Duration;

use crate::security::cidr::IpCidr;
use crate::security::TrustError;

/// Largest feed body accepted. The published lists are a few hundred bytes.
pub const MAX_FEED_BYTES: usize = 256 * 1024;

/// Parse a feed body. Blank lines and `#` comments are ignored, invalid
/// lines are logged and skipped.
pub fn parse_feed(text: &str) -> Vec<IpCidr> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match line.parse::<IpCidr>() {
            Ok(cidr) => Some(cidr),
            Err(e) => {
                tracing::warn!(line = %line, error = %e, "Skipping invalid feed entry");
                None
            }
        })
        .collect()
}

/// HTTP client for the range feeds.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(timeout: Duration) -> Result<Self, TrustError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrustError::SourceFetchFailed {
                source_name: "feed client".into(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Fetch and parse one feed.
    pub async fn fetch(&self, url: &str) -> Result<Vec<IpCidr>, TrustError> {
        let failed = |message: String| TrustError::SourceFetchFailed {
            source_name: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| failed(e.to_string()))?;
        if let Some(len) = response.content_length() {
            if len > MAX_FEED_BYTES as u64 {
                return Err(failed(format!("body of {len} bytes exceeds {MAX_FEED_BYTES}")));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
            if body.len() + chunk.len() > MAX_FEED_BYTES {
                return Err(failed(format!("body exceeds {MAX_FEED_BYTES} bytes")));
            }
            body.extend_from_slice(&chunk);
        }

        let ranges = parse_feed(&String::from_utf8_lossy(&body));
        tracing::info!(url = %url, count = ranges.len(), "Fetched proxy range feed");
        Ok(ranges)
    }

    /// Fetch every URL, degrading to an empty contribution for each failure.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<IpCidr> {
        let mut all = Vec::new();
        for url in urls {
            match self.fetch(url).await {
                Ok(ranges) => all.extend(ranges),
                Err(e) => tracing::warn!(error = %e, "Proxy range feed unavailable, continuing without it"),
            }
        }
        all
    }
}
