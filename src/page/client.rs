//! HTTP client for detail pages using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::sites::Site;
use anyhow::{Context, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// A fetched document and the URL it was served from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
}

/// HTTP fetcher with browser impersonation and anti-bot measures.
pub struct HttpFetcher {
    client: Client,
    site: Site,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl HttpFetcher {
    /// Creates a new fetcher for `site` with the given configuration.
    pub async fn new(config: &Config, site: Site) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_millis(config.navigation_timeout_ms))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            site,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Performs a GET request with all anti-bot measures.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.delay().await;

        info!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.site.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or increasing delay.");
            anyhow::bail!("Rate limited by {}. Try again later or use a proxy.", self.site);
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        let final_url = response.uri().to_string();
        if final_url != url {
            debug!("Redirected to {}", final_url);
        }

        let body = response.text().await.context("Failed to read response body")?;
        Ok(FetchedPage { url: final_url, body })
    }

    /// Adds a random delay to mimic human behavior.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config { delay_ms: 0, delay_jitter_ms: 0, ..Config::default() }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <div class="title-first-column"><div class="title-text">Widget X</div></div>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/offer/1.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config(), Site::Alibaba).await.unwrap();
        let url = format!("{}/offer/1.html", mock_server.uri());

        let page = fetcher.fetch(&url).await.unwrap();
        assert!(page.body.contains("Widget X"));
        assert!(page.url.ends_with("/offer/1.html"));
    }

    #[tokio::test]
    async fn test_fetch_sends_site_language() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B0TEST"))
            .and(header("Accept-Language", Site::Amazon.accept_language()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config(), Site::Amazon).await.unwrap();
        let page = fetcher.fetch(&format!("{}/dp/B0TEST", mock_server.uri())).await.unwrap();
        assert!(page.body.contains("ok"));
    }

    #[tokio::test]
    async fn test_rate_limited_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config(), Site::Amazon).await.unwrap();
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err().to_string();
        assert!(err.contains("Rate limited"));
    }

    #[tokio::test]
    async fn test_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config(), Site::Alibaba).await.unwrap();
        let err = fetcher.fetch(&mock_server.uri()).await.unwrap_err().to_string();
        assert!(err.contains("404"));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config(), Site::Alibaba).await.unwrap();
        let page = fetcher.fetch(&mock_server.uri()).await.unwrap();
        assert!(page.body.is_empty());
    }
}
