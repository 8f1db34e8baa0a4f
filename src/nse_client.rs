use crate::config::*;
use crate::models::OptionChain;
use anyhow::{Context, Result};
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct OptionChainClient {
    client: Client,
    warmed_up: Arc<RwLock<bool>>,
}

impl OptionChainClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            warmed_up: Arc::new(RwLock::new(false)),
        })
    }

    /// NSE only serves the API once the home page has set its cookies
    async fn warmup_if_needed(&self) -> Result<()> {
        // Already warmed up
        if *self.warmed_up.read().await {
            return Ok(());
        }

        // Take the write lock, another task may have won the race
        let mut warmed = self.warmed_up.write().await;
        if !*warmed {
            self.client
                .get(NSE_BASE_URL)
                .header(header::ACCEPT, HEADER_ACCEPT_HTML)
                .timeout(WARMUP_TIMEOUT)
                .send()
                .await
                .context("Failed to warm up NSE session")?;

            // Give the session cookies a moment to settle
            tokio::time::sleep(Duration::from_millis(WARMUP_DELAY_MS)).await;
            *warmed = true;
            tracing::debug!("NSE session warmed up");
        }

        Ok(())
    }

    /// GET a JSON body with exponential-backoff retries
    async fn fetch_json(&self, url: &str) -> Result<String> {
        self.warmup_if_needed().await?;

        let backoff = ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS)
            .factor(RETRY_FACTOR)
            .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
            .take(RETRY_MAX_ATTEMPTS);

        Retry::spawn(backoff, || async {
            let res = self
                .client
                .get(url)
                .header(header::REFERER, NSE_OPTION_CHAIN_REFERER)
                .header(header::ACCEPT, HEADER_ACCEPT_JSON)
                .send()
                .await
                .context("Request send failed")?;

            let status = res.status();

            // Handle different status codes
            if status.is_success() {
                let text = res.text().await.context("Failed to read body")?;

                // NSE answers blocked sessions with an HTML page and 200
                let trimmed = text.trim();
                if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
                    let preview: String = text.chars().take(200).collect();
                    anyhow::bail!("Non-JSON response: {}", preview);
                }

                Ok(text)
            } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                // Retry on rate limits and server errors
                tracing::warn!(%status, url, "Retryable NSE response");
                anyhow::bail!("Retryable error: {}", status)
            } else {
                // Fail fast on other client errors
                let body = res.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                anyhow::bail!("Client error {}: {}", status, preview)
            }
        })
        .await
    }

    // -----------------------------------------------
    // FETCH OPTION CHAIN
    // -----------------------------------------------
    pub async fn fetch_option_chain(&self, symbol: &str) -> Result<OptionChain> {
        let url = nse_option_chain_url(symbol);
        let text = self
            .fetch_json(&url)
            .await
            .with_context(|| format!("Failed to fetch option chain for {}", symbol))?;

        let chain: OptionChain = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse option chain for {}", symbol))?;

        tracing::debug!(symbol, strikes = chain.records.data.len(), "Option chain fetched");
        Ok(chain)
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    // Rotate Accept-Language between clients
    let lang = ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_str(lang)?);

    Client::builder()
        .default_headers(headers)
        .cookie_store(true) // NSE tracks the session in cookies
        .gzip(true)
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_client_starts_cold() {
        let client = OptionChainClient::new().unwrap();
        assert!(!*client.warmed_up.read().await);
    }
}
