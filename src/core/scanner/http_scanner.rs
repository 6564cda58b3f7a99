// src/core/scanner/http_scanner.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{debug, info, warn};

use crate::core::models::Accessibility;
use crate::core::normalizer::NormalizedUrl;

/// Redirect hops followed before the probe gives up.
pub const MAX_REDIRECTS: usize = 10;

/// Checks whether a URL answers an HTTP GET.
#[async_trait]
pub trait AccessibilityProbe: Send + Sync {
    async fn check(&self, url: &NormalizedUrl) -> Accessibility;
}

/// `reqwest`-backed probe. A final 2xx status counts as reachable.
pub struct HttpAccessibilityProbe {
    client: reqwest::Client,
    http_fallback: bool,
}

impl HttpAccessibilityProbe {
    /// Builds the probe around a client with a total request timeout.
    ///
    /// With `http_fallback` set, an unreachable `https` URL gets exactly one
    /// more attempt over plain `http`.
    pub fn new(timeout: Duration, user_agent: &str, http_fallback: bool) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client, http_fallback })
    }

    async fn fetch(&self, url: &str) -> Accessibility {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                info!(url, status = %status, "Received HTTP response.");
                if status.is_success() {
                    Accessibility::Reachable { status: status.as_u16() }
                } else {
                    Accessibility::Unreachable { status: Some(status.as_u16()) }
                }
            }
            Err(e) => {
                warn!(url, error = %e, "HTTP request failed.");
                Accessibility::Unreachable { status: e.status().map(|s| s.as_u16()) }
            }
        }
    }
}

#[async_trait]
impl AccessibilityProbe for HttpAccessibilityProbe {
    async fn check(&self, url: &NormalizedUrl) -> Accessibility {
        info!(url = %url, "Starting accessibility check.");
        let outcome = self.fetch(url.as_str()).await;
        if outcome.is_reachable() || !self.http_fallback {
            return outcome;
        }

        match url.downgraded() {
            Some(plain) => {
                debug!(fallback = %plain, "Retrying over plain HTTP.");
                let fallback = self.fetch(plain.as_str()).await;
                if fallback.is_reachable() { fallback } else { outcome }
            }
            None => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(fallback: bool) -> HttpAccessibilityProbe {
        HttpAccessibilityProbe::new(Duration::from_secs(2), "url-trust-tests", fallback).unwrap()
    }

    async fn server_with(route: &str, template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn url(raw: &str) -> NormalizedUrl {
        NormalizedUrl::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn success_status_is_reachable() {
        let server = server_with("/ok", ResponseTemplate::new(200)).await;
        let outcome = probe(false).check(&url(&format!("{}/ok", server.uri()))).await;
        assert_eq!(outcome, Accessibility::Reachable { status: 200 });
    }

    #[tokio::test]
    async fn error_status_is_unreachable_but_kept() {
        let server = server_with("/gone", ResponseTemplate::new(404)).await;
        let outcome = probe(false).check(&url(&format!("{}/gone", server.uri()))).await;
        assert_eq!(outcome, Accessibility::Unreachable { status: Some(404) });
    }

    #[tokio::test]
    async fn redirects_are_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = probe(false).check(&url(&format!("{}/old", server.uri()))).await;
        assert_eq!(outcome, Accessibility::Reachable { status: 200 });
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = server_with("/slow", ResponseTemplate::new(200).set_delay(Duration::from_secs(5))).await;
        let outcome = probe(false).check(&url(&format!("{}/slow", server.uri()))).await;
        assert_eq!(outcome, Accessibility::Unreachable { status: None });
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = probe(false).check(&url(&format!("http://127.0.0.1:{port}/"))).await;
        assert!(!outcome.is_reachable());
    }

    #[tokio::test]
    async fn https_failure_falls_back_to_http_once() {
        let server = server_with("/ok", ResponseTemplate::new(200)).await;
        let port = server.address().port();
        let secure = url(&format!("https://127.0.0.1:{port}/ok"));

        assert!(!probe(false).check(&secure).await.is_reachable());
        assert_eq!(probe(true).check(&secure).await, Accessibility::Reachable { status: 200 });
    }
}
