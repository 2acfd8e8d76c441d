//! Single-shot requests against the reporting backend.
//!
//! Every call is one round trip: no retry, no backoff. Non-2xx statuses and
//! transport failures come back as errors and the caller decides whether to
//! log and drop them.

use serde::de::DeserializeOwned;
use std::time::Duration;
use ureq::Agent;

use super::endpoint::{join_url, Endpoint};
use super::filter::QueryParams;
use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire
pub trait Transport: Send + Sync {
    fn send(&self, method: Method, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// Blocking HTTP transport on a shared ureq agent
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        let agent: Agent = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let transport_error = |e: ureq::Error| ReportError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = match method {
            Method::Get => {
                let mut request = self.agent.get(url);
                for (name, value) in headers {
                    request = request.header(*name, *value);
                }
                request.call()
            }
            Method::Patch => {
                let mut request = self.agent.patch(url);
                for (name, value) in headers {
                    request = request.header(*name, *value);
                }
                request.send_empty()
            }
        };
        let mut response = response.map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse { status, body })
    }
}

pub struct ReportFetcher<T: Transport> {
    base_url: String,
    transport: T,
    cookie: Option<String>,
}

impl ReportFetcher<HttpTransport> {
    pub fn http(base_url: &str, timeout_secs: u64) -> Self {
        Self::new(base_url, HttpTransport::new(timeout_secs))
    }
}

impl<T: Transport> ReportFetcher<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.to_string(),
            transport,
            cookie: None,
        }
    }

    /// Session cookie sent with every request
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Full request URL for an endpoint and query
    pub fn url(&self, endpoint: &Endpoint, query: &QueryParams) -> String {
        let url = join_url(&self.base_url, &endpoint.path());
        if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query.to_query_string())
        }
    }

    /// GET an endpoint and return the raw body (usually an HTML fragment)
    pub fn fetch(&self, endpoint: &Endpoint, query: &QueryParams) -> Result<String> {
        let url = self.url(endpoint, query);
        self.send(Method::Get, &url, &[])
    }

    /// GET an endpoint and decode its JSON body
    pub fn fetch_json<D: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        query: &QueryParams,
    ) -> Result<D> {
        let url = self.url(endpoint, query);
        let body = self.send(Method::Get, &url, &[])?;
        serde_json::from_str(&body).map_err(|source| ReportError::Decode { url, source })
    }

    /// PATCH a path relative to the base URL with extra headers
    pub fn patch(&self, path: &str, headers: &[(&str, &str)]) -> Result<String> {
        let url = join_url(&self.base_url, path);
        self.send(Method::Patch, &url, headers)
    }

    fn send(&self, method: Method, url: &str, extra: &[(&str, &str)]) -> Result<String> {
        let mut headers: Vec<(&str, &str)> = Vec::with_capacity(extra.len() + 1);
        if let Some(cookie) = self.cookie.as_deref() {
            headers.push(("Cookie", cookie));
        }
        headers.extend_from_slice(extra);

        log::debug!("{:?} {}", method, url);
        let response = self.transport.send(method, url, &headers)?;
        if !response.is_success() {
            return Err(ReportError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use serde_json::Value;

    #[test]
    fn builds_url_with_query() {
        let fetcher = ReportFetcher::new("http://localhost:8000/", FakeTransport::new());
        let mut query = QueryParams::new();
        query.push("material", "m 1");
        assert_eq!(
            fetcher.url(&Endpoint::Transactions, &query),
            "http://localhost:8000/reports/get-transactions/?material=m%201"
        );
        assert_eq!(
            fetcher.url(&Endpoint::StockLevels, &QueryParams::new()),
            "http://localhost:8000/reports/get-stock-levels/"
        );
    }

    #[test]
    fn returns_body_on_success() {
        let transport = FakeTransport::new().route("get-stock-levels", 200, "<div>plot</div>");
        let fetcher = ReportFetcher::new("http://h", transport);
        let body = fetcher
            .fetch(&Endpoint::StockLevels, &QueryParams::new())
            .unwrap();
        assert_eq!(body, "<div>plot</div>");
    }

    #[test]
    fn non_2xx_is_an_error() {
        let transport = FakeTransport::new().route("get-summary", 500, "boom");
        let fetcher = ReportFetcher::new("http://h", transport);
        let err = fetcher
            .fetch(&Endpoint::Summary, &QueryParams::new())
            .unwrap_err();
        assert!(matches!(err, ReportError::Status { status: 500, .. }));
    }

    #[test]
    fn bad_json_is_a_decode_error() {
        let transport = FakeTransport::new().route("get-material-groups", 200, "<html>");
        let fetcher = ReportFetcher::new("http://h", transport);
        let err = fetcher
            .fetch_json::<Value>(&Endpoint::MaterialGroups, &QueryParams::new())
            .unwrap_err();
        assert!(matches!(err, ReportError::Decode { .. }));
    }

    #[test]
    fn request_is_not_retried() {
        let transport = FakeTransport::new().fail("get-financials");
        let fetcher = ReportFetcher::new("http://h", transport);
        assert!(fetcher
            .fetch(&Endpoint::Financials, &QueryParams::new())
            .is_err());
        assert_eq!(fetcher.transport().count("get-financials"), 1);
    }

    #[test]
    fn cookie_goes_first_then_extra_headers() {
        let transport = FakeTransport::new().route("generate", 200, "{}");
        let fetcher = ReportFetcher::new("http://h", transport)
            .with_cookie(Some("csrftoken=abc".to_string()));
        fetcher
            .patch("/documents/x/generate", &[("X-CSRFToken", "abc")])
            .unwrap();
        let sent = &fetcher.transport().requests()[0];
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(
            sent.headers,
            vec![
                ("Cookie".to_string(), "csrftoken=abc".to_string()),
                ("X-CSRFToken".to_string(), "abc".to_string()),
            ]
        );
    }
}
