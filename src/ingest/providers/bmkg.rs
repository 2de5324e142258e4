use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::ingest::types::FeedSource;

/// Felt-earthquake list published by the Indonesian agency.
pub const DEFAULT_FEED_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS/gempadirasakan.json";

pub struct BmkgFeed {
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can hand in any &str.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl BmkgFeed {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }
}

#[async_trait]
impl FeedSource for BmkgFeed {
    async fn fetch_raw(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url, client } => {
                let t0 = std::time::Instant::now();
                let resp = match client.get(url.as_str()).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = "BMKG", "feed http error");
                        counter!("feed_fetch_errors_total").increment(1);
                        return Err(e).context("feed http get()");
                    }
                };
                let status = resp.status();
                if !status.is_success() {
                    counter!("feed_fetch_errors_total").increment(1);
                    anyhow::bail!("feed {url} returned status {status}");
                }
                let body = resp.text().await.context("feed http .text()")?;
                histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                Ok(body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "BMKG"
    }
}
