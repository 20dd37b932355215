// Envelope API HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, envelope
// unwrapping, and rejection normalization. Every failure mode -- transport
// fault, unparseable body, malformed envelope, or a semantic error reported
// by the server -- comes back as the same `ApiRejection` shape. Retry
// policy does not live here; it belongs to the request lifecycle layer.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::envelope::{ApiResponse, is_api_response_valid};
use crate::error::{ApiCode, ApiRejection, RequestStatus};
use crate::transport::{TransportConfig, TransportError};

/// HTTP method for an API call. The envelope protocol only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Client for the campus-services envelope API.
///
/// All methods return unwrapped `data` payloads -- the envelope is
/// stripped and validated before the caller sees anything.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from a [`TransportConfig`].
    pub fn new(transport: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: transport.base_url.clone(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`. Used by tests
    /// pointing at a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API endpoint root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for an API path.
    fn api_url(&self, path: &str) -> Result<Url, ApiRejection> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(|e| ApiRejection {
            status: RequestStatus::Unknown,
            code: None,
            message: Some(format!("invalid request URL: {e}")),
        })
    }

    /// Send a GET request and unwrap the envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiRejection> {
        self.request(path, Method::Get, None, token).await
    }

    /// Send a POST request with a JSON body and unwrap the envelope.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<T, ApiRejection> {
        self.request(path, Method::Post, Some(body), token).await
    }

    /// The generic envelope request.
    ///
    /// 1. Issue the call (bearer credential attached when a token is given).
    /// 2. A transport failure rejects with `ConnectionError` -- the
    ///    underlying error's content never leaks into the taxonomy.
    /// 3. A body that fails to parse, or a parsed envelope that violates
    ///    the contract, rejects as a server error carrying the HTTP status.
    /// 4. A valid envelope with a non-success domain code rejects with
    ///    `{ status, code, message }` -- the call completed, the failure
    ///    is semantic.
    /// 5. A valid success envelope resolves with the decoded `data`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<T, ApiRejection> {
        let url = self.api_url(path)?;
        debug!(%url, ?method, "api request");

        let mut builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            debug!(error = %e, "transport failure");
            ApiRejection::connection_error()
        })?;

        let http_status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| {
            debug!(error = %e, "failed to read response body");
            ApiRejection::connection_error()
        })?;

        let envelope: ApiResponse<Value> = serde_json::from_str(&text).map_err(|e| {
            // char-based cut: the body may be arbitrary non-ASCII text
            let preview: String = text.chars().take(200).collect();
            debug!(http_status, "unparseable response body: {preview:?}");
            ApiRejection::invalid_response(http_status, format!("invalid server response: {e}"))
        })?;

        if !is_api_response_valid(&envelope) {
            debug!(http_status, status = ?envelope.status, "invalid envelope");
            return Err(ApiRejection::invalid_response(
                http_status,
                "invalid server response",
            ));
        }

        let code = envelope.code().expect("validated envelope has a code");
        if code != ApiCode::Success {
            trace!(?code, "domain rejection");
            return Err(ApiRejection {
                status: RequestStatus::from_http(http_status),
                code: Some(code),
                message: envelope.message,
            });
        }

        let data = envelope.data.expect("validated success envelope has data");
        serde_json::from_value(data).map_err(|e| {
            debug!(error = %e, "payload did not match expected shape");
            ApiRejection::invalid_response(http_status, format!("invalid server response: {e}"))
        })
    }
}
