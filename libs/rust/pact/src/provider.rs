//! Provider invocation seam and its HTTP implementation.

use crate::contract::Request;
use crate::error::InteractionError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use rust_common::{HttpConfig, PlatformError, build_http_client};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The outbound request built from a contract request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    /// Uppercased HTTP method
    pub method: String,
    /// Path, starting with `/`
    pub path: String,
    /// Query pairs in parameter-name order, values in declared order
    pub query: Vec<(String, String)>,
    /// Header name and value pairs
    pub headers: Vec<(String, String)>,
    /// Encoded body
    pub body: Option<Vec<u8>>,
}

impl ProviderRequest {
    /// Build the outbound request for a contract request.
    ///
    /// JSON is the default body encoding. A string body with a non-JSON
    /// content type is sent verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::InvalidRequest`] for an invalid method
    /// or a path not starting with `/`.
    pub fn from_contract(request: &Request) -> Result<Self, InteractionError> {
        let method = request.method.trim().to_ascii_uppercase();
        if Method::from_bytes(method.as_bytes()).is_err() || method.is_empty() {
            return Err(InteractionError::InvalidRequest {
                reason: format!("invalid method `{}`", request.method),
            });
        }
        if !request.path.starts_with('/') {
            return Err(InteractionError::InvalidRequest {
                reason: format!("path `{}` does not start with `/`", request.path),
            });
        }

        let query = request
            .query
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name.clone(), value.clone())))
            .collect();
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let content_type = request.header("content-type").map(str::to_string);
        let body = match &request.body {
            None => None,
            Some(Value::String(text))
                if content_type.as_deref().is_some_and(|ct| !is_json_content_type(ct)) =>
            {
                Some(text.clone().into_bytes())
            }
            Some(value) => {
                if content_type.is_none() {
                    headers.push(("Content-Type".to_string(), "application/json".to_string()));
                }
                Some(serde_json::to_vec(value).map_err(|err| InteractionError::InvalidRequest {
                    reason: format!("body could not be encoded: {err}"),
                })?)
            }
        };

        Ok(Self {
            method,
            path: request.path.clone(),
            query,
            headers,
            body,
        })
    }
}

/// What the provider answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResponse {
    /// Status code
    pub status: u16,
    /// Headers by lowercased name; repeated headers are joined with `, `
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl ProviderResponse {
    /// A response with the given status and no headers or body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header; the name is lowercased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set a JSON body and a matching content type.
    #[must_use]
    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = body.to_string().into_bytes();
        self.with_header("content-type", "application/json")
    }

    /// Set a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The `content-type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// The body as a value to compare: `None` when empty, decoded JSON for
    /// JSON content (or undeclared content that parses), a string otherwise.
    #[must_use]
    pub fn body_value(&self) -> Option<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        let declared_json = self.content_type().is_none_or(is_json_content_type);
        if declared_json {
            if let Ok(value) = serde_json::from_slice(&self.body) {
                return Some(value);
            }
        }
        Some(Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }
}

/// Whether a content type denotes JSON, e.g. `application/json; charset=utf-8`
/// or `application/vnd.api+json`.
#[must_use]
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Something that can answer provider requests.
///
/// The verifier calls `invoke` exactly once per interaction and also wraps
/// the call in its own timeout.
#[async_trait]
pub trait ProviderInvoker: Send + Sync {
    /// Send `request` and return the provider's answer.
    async fn invoke(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, PlatformError>;
}

/// Invokes a provider over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProviderInvoker {
    base_url: Url,
    client: Client,
}

impl HttpProviderInvoker {
    /// Create an invoker for the provider at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidInput`] for an unusable base URL and
    /// [`PlatformError::Http`] if the client cannot be built.
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self, PlatformError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| PlatformError::invalid_input(format!("invalid base URL `{base_url}`: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::invalid_input(format!(
                "base URL `{base_url}` cannot carry a path"
            )));
        }
        let client = build_http_client(config)?;
        Ok(Self { base_url, client })
    }

    /// The provider base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for a request: the base path is kept as a prefix.
    #[must_use]
    pub fn url_for(&self, request: &ProviderRequest) -> Url {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", request.path));
        url.set_query(None);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        url
    }
}

#[async_trait]
impl ProviderInvoker for HttpProviderInvoker {
    async fn invoke(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, PlatformError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|err| PlatformError::invalid_input(format!("invalid method: {err}")))?;
        let url = self.url_for(request);

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| PlatformError::invalid_input(format!("invalid header name `{name}`: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| PlatformError::invalid_input(format!("invalid header value: {err}")))?;
            headers.append(name, value);
        }

        debug!(method = %method, url = %url, "Invoking provider");
        let mut builder = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let headers = joined_headers(response.headers());
        let body = response.bytes().await.map_err(map_transport_error)?.to_vec();

        Ok(ProviderResponse {
            status,
            headers,
            body,
        })
    }
}

/// Response headers keyed by lowercased name, repeats joined with `, `.
pub(crate) fn joined_headers(map: &HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}

fn map_transport_error(err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::timeout(err.to_string())
    } else if err.is_connect() {
        PlatformError::unavailable(err.to_string())
    } else {
        PlatformError::Http(err)
    }
}
