//! In-process provider invocation over a `tower` service.

use crate::provider::{ProviderInvoker, ProviderRequest, ProviderResponse, joined_headers};
use async_trait::async_trait;
use http::{HeaderName, HeaderValue, Method, Request, Response};
use rust_common::PlatformError;
use std::time::Duration;
use tower::{BoxError, Service, ServiceExt};
use tracing::debug;
use url::{Position, Url};

/// Invokes a provider running in the same process, such as a router under
/// test, without binding a socket.
///
/// Any `tower::Service` that takes an `http::Request<Vec<u8>>` will do. The
/// service is cloned for every call and driven with `oneshot`, so readiness
/// is awaited per request.
#[derive(Debug, Clone)]
pub struct ServiceInvoker<S> {
    service: S,
}

impl<S> ServiceInvoker<S> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(service: S) -> Self {
        Self { service }
    }
}

/// The request an in-process service receives for a provider request.
///
/// The target is origin-form (`/path?query`), percent-encoded the same way
/// the HTTP invoker encodes its URLs.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] for a method, header or target
/// that `http` rejects.
pub fn http_request(request: &ProviderRequest) -> Result<Request<Vec<u8>>, PlatformError> {
    let mut url = Url::parse("http://localhost")
        .map_err(|err| PlatformError::internal(format!("placeholder origin: {err}")))?;
    url.set_path(&request.path);
    if !request.query.is_empty() {
        url.query_pairs_mut().extend_pairs(&request.query);
    }
    let method = Method::from_bytes(request.method.as_bytes())
        .map_err(|err| PlatformError::invalid_input(format!("invalid method: {err}")))?;

    let mut builder = Request::builder().method(method).uri(&url[Position::BeforePath..]);
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| PlatformError::invalid_input(format!("invalid header name `{name}`: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| PlatformError::invalid_input(format!("invalid header value: {err}")))?;
        builder = builder.header(name, value);
    }
    builder
        .body(request.body.clone().unwrap_or_default())
        .map_err(|err| PlatformError::invalid_input(format!("invalid request: {err}")))
}

fn provider_response<B: Into<Vec<u8>>>(response: Response<B>) -> ProviderResponse {
    let (parts, body) = response.into_parts();
    ProviderResponse {
        status: parts.status.as_u16(),
        headers: joined_headers(&parts.headers),
        body: body.into(),
    }
}

#[async_trait]
impl<S, B> ProviderInvoker for ServiceInvoker<S>
where
    S: Service<Request<Vec<u8>>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: Into<Vec<u8>> + Send,
{
    // The verifier enforces the deadline around this call.
    async fn invoke(
        &self,
        request: &ProviderRequest,
        _timeout: Duration,
    ) -> Result<ProviderResponse, PlatformError> {
        let http_request = http_request(request)?;
        debug!(method = %http_request.method(), uri = %http_request.uri(), "Invoking in-process provider");
        let response = self
            .service
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|err| PlatformError::unavailable(Into::<BoxError>::into(err).to_string()))?;
        Ok(provider_response(response))
    }
}
