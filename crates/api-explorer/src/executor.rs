//! Execute test requests against the API under exploration

use indexmap::IndexMap;
use openapi_parser::{Endpoint, HttpMethod, ParameterLocation};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{ExplorerError, Result};

/// Characters escaped in path values, matching JavaScript's `encodeURIComponent`
const PATH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a request URL from a path template.
///
/// `{name}` placeholders are replaced by encoded values; placeholders with
/// no value are left in place. Query entries with empty values are dropped.
pub fn build_url(
    base_url: &str,
    path: &str,
    path_params: &IndexMap<String, String>,
    query_params: &IndexMap<String, String>,
) -> String {
    let mut url = format!("{}{}", base_url.trim_end_matches('/'), path);

    for (name, value) in path_params {
        if value.is_empty() {
            continue;
        }
        let encoded = utf8_percent_encode(value, PATH_VALUE).to_string();
        url = url.replace(&format!("{{{}}}", name), &encoded);
    }

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut has_query = false;
    for (name, value) in query_params {
        if value.is_empty() {
            continue;
        }
        query.append_pair(name, value);
        has_query = true;
    }

    if has_query {
        url.push('?');
        url.push_str(&query.finish());
    }

    url
}

/// User input for one test request
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    pub path_params: IndexMap<String, String>,
    pub query_params: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    /// Overrides the executor's token for this request
    pub bearer_token: Option<String>,
    /// Raw body text as typed by the user
    pub body: Option<String>,
}

impl TestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Route `name=value` pairs to the endpoint's declared parameter locations.
    ///
    /// Cookie parameters are folded into a single `Cookie` header.
    pub fn from_pairs<I>(endpoint: &Endpoint, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = Self::new();
        let mut cookies = Vec::new();

        for (name, value) in pairs {
            let param = endpoint.parameter(&name).ok_or_else(|| {
                ExplorerError::InvalidArgument(format!(
                    "{} has no parameter named '{}'",
                    endpoint.label(),
                    name
                ))
            })?;

            match param.location {
                ParameterLocation::Path => {
                    request.path_params.insert(name, value);
                }
                ParameterLocation::Query => {
                    request.query_params.insert(name, value);
                }
                ParameterLocation::Header => {
                    request.headers.insert(name, value);
                }
                ParameterLocation::Cookie => cookies.push(format!("{}={}", name, value)),
            }
        }

        if !cookies.is_empty() {
            request.headers.insert("Cookie".to_string(), cookies.join("; "));
        }

        Ok(request)
    }
}

/// A validated request, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Response payload, parsed as JSON when the server says it is JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

/// Outcome of a test request that reached the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedResponse {
    pub status: u16,
    pub status_text: String,
    /// Milliseconds from sending the request to receiving the response headers
    pub elapsed_ms: u64,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl ExecutedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends test requests with the configured timeout and token
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    bearer_token: Option<String>,
}

impl RequestExecutor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Request(e.to_string()))?;

        Ok(Self {
            client,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    /// Build the URL, headers and body. Fails on an invalid JSON body
    /// without touching the network.
    pub fn prepare(
        &self,
        base_url: &str,
        endpoint: &Endpoint,
        request: &TestRequest,
    ) -> Result<PreparedRequest> {
        let url = build_url(
            base_url,
            &endpoint.path,
            &request.path_params,
            &request.query_params,
        );

        let text = request.body.as_deref().map(str::trim).filter(|b| !b.is_empty());
        let body = match text {
            Some(text) if endpoint.method.has_body() => Some(
                serde_json::from_str::<Value>(text)
                    .map_err(|e| ExplorerError::InvalidBody(e.to_string()))?,
            ),
            Some(_) => {
                debug!("Ignoring body for {} request", endpoint.method);
                None
            }
            None => None,
        };

        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        let token = request
            .bearer_token
            .as_deref()
            .or(self.bearer_token.as_deref())
            .filter(|t| !t.is_empty());
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        for (name, value) in &request.headers {
            if !name.trim().is_empty() && !value.trim().is_empty() {
                headers.push((name.clone(), value.clone()));
            }
        }

        Ok(PreparedRequest {
            method: endpoint.method,
            url,
            headers,
            body,
        })
    }

    /// Prepare and send a test request
    pub async fn execute(
        &self,
        base_url: &str,
        endpoint: &Endpoint,
        request: &TestRequest,
    ) -> Result<ExecutedResponse> {
        let prepared = self.prepare(base_url, endpoint, request)?;
        self.send(&prepared).await
    }

    pub async fn send(&self, prepared: &PreparedRequest) -> Result<ExecutedResponse> {
        let method = match prepared.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Trace => reqwest::Method::TRACE,
        };

        let mut request = self.client.request(method, &prepared.url);
        for (name, value) in &prepared.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &prepared.body {
            request = request.body(serde_json::to_string(body)?);
        }

        info!("{} {}", prepared.method, prepared.url);

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", prepared.url, e);
            ExplorerError::Request(e.to_string())
        })?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let is_json = headers
            .iter()
            .any(|(name, value)| name == "content-type" && value.contains("application/json"));

        let text = response
            .text()
            .await
            .map_err(|e| ExplorerError::Request(e.to_string()))?;

        let body = if is_json {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => ResponseBody::Json(value),
                Err(e) => {
                    debug!("Response claims JSON but does not parse: {}", e);
                    ResponseBody::Text(text)
                }
            }
        } else {
            ResponseBody::Text(text)
        };

        debug!("{} {} -> {} in {}ms", prepared.method, prepared.url, status, elapsed_ms);

        Ok(ExecutedResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            elapsed_ms,
            headers,
            body,
        })
    }
}
