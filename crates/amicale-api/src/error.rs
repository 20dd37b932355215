use thiserror::Error;

/// Domain code reported inside the response envelope.
///
/// This is the application-level outcome, distinct from the raw HTTP
/// status. `ConnectionError` is client-synthesized and never sent by the
/// server; unknown wire values are rejected as malformed envelopes rather
/// than silently mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCode {
    Success,
    BadCredentials,
    BadToken,
    NoConsent,
    BadInput,
    Forbidden,
    ServerError,
    ConnectionError,
    Unknown,
}

impl ApiCode {
    /// Decode a wire value. Returns `None` for unrecognized codes --
    /// the caller treats those as an invalid envelope.
    pub fn from_wire(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::BadCredentials),
            2 => Some(Self::BadToken),
            3 => Some(Self::NoConsent),
            400 => Some(Self::BadInput),
            403 => Some(Self::Forbidden),
            500 => Some(Self::ServerError),
            600 => Some(Self::ConnectionError),
            999 => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::BadCredentials => 1,
            Self::BadToken => 2,
            Self::NoConsent => 3,
            Self::BadInput => 400,
            Self::Forbidden => 403,
            Self::ServerError => 500,
            Self::ConnectionError => 600,
            Self::Unknown => 999,
        }
    }
}

/// Client-side request status taxonomy.
///
/// Values mirror HTTP statuses where one applies, but `TokenSave`,
/// `TokenRetrieve`, and `ConnectionError` are purely client-side.
/// This is the single unified taxonomy -- connection failures are always
/// `ConnectionError` (600), never aliased onto 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    /// Persisting the session token to secure storage failed.
    TokenSave,
    /// No session token was available for an authenticated request.
    TokenRetrieve,
    BadInput,
    Forbidden,
    NotFound,
    ServerError,
    /// Transport-level failure (DNS, timeout, connection refused).
    ConnectionError,
    Unknown,
}

impl RequestStatus {
    /// Map an HTTP status code onto the client taxonomy.
    pub fn from_http(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            400 => Self::BadInput,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::TokenSave => 4,
            Self::TokenRetrieve => 5,
            Self::BadInput => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::ServerError => 500,
            Self::ConnectionError => 600,
            Self::Unknown => 999,
        }
    }
}

/// The one rejection shape every failure mode folds into.
///
/// Whether the failure came from the transport, from JSON parsing, or from
/// the server's own error reporting, callers always see this struct: a
/// client-side status, the domain code when the server supplied one, and
/// an optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request rejected (status {status:?}, code {code:?})")]
pub struct ApiRejection {
    pub status: RequestStatus,
    pub code: Option<ApiCode>,
    pub message: Option<String>,
}

impl ApiRejection {
    /// Transport could not complete the call.
    pub fn connection_error() -> Self {
        Self {
            status: RequestStatus::ConnectionError,
            code: None,
            message: None,
        }
    }

    /// The response body did not match the envelope contract.
    ///
    /// Carries the HTTP status the server actually returned; a 2xx with a
    /// malformed body degrades to `ServerError`.
    pub fn invalid_response(http_status: u16, message: impl Into<String>) -> Self {
        let status = match RequestStatus::from_http(http_status) {
            RequestStatus::Success => RequestStatus::ServerError,
            other => other,
        };
        Self {
            status,
            code: None,
            message: Some(message.into()),
        }
    }

    /// No session token is available for an authenticated call.
    pub fn no_credential() -> Self {
        Self {
            status: RequestStatus::TokenRetrieve,
            code: None,
            message: None,
        }
    }

    /// True when the session credential is invalid or expired.
    ///
    /// Critical rejections are never just displayed -- they force a
    /// logout and re-authentication.
    pub fn is_critical(&self) -> bool {
        self.code == Some(ApiCode::BadToken)
    }

    /// True for failure classes where retrying can help (transport and
    /// server-side faults). Domain rejections are not retryable except
    /// by the user correcting their input.
    pub fn is_retryable(&self) -> bool {
        match self.code {
            Some(ApiCode::ServerError | ApiCode::ConnectionError) => true,
            Some(_) => false,
            None => matches!(
                self.status,
                RequestStatus::ConnectionError | RequestStatus::ServerError | RequestStatus::Unknown
            ),
        }
    }
}

/// Secure-storage failure. A single attempt is made per call; callers
/// decide whether the failure is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("secure storage read failed: {0}")]
    Retrieve(String),

    #[error("secure storage write failed: {0}")]
    Save(String),

    #[error("secure storage clear failed: {0}")]
    Clear(String),
}

impl From<StoreError> for ApiRejection {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::Retrieve(_) => RequestStatus::TokenRetrieve,
            StoreError::Save(_) | StoreError::Clear(_) => RequestStatus::TokenSave,
        };
        Self {
            status,
            code: None,
            message: Some(err.to_string()),
        }
    }
}
