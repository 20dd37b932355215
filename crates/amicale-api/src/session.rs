// Session management
//
// Owns the in-memory session token and its persisted copy. The token is
// the only cross-component shared mutable state in the subsystem, so it
// sits behind an `RwLock`; writers are `login`, `logout`, and
// `recover_session`, all idempotent. Construct exactly one `SessionManager`
// per process and pass it to the data-access components explicitly --
// there is deliberately no global instance.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::credentials::CredentialStore;
use crate::error::{ApiRejection, RequestStatus, StoreError};

/// Login endpoint path.
const AUTH_PATH: &str = "password";

/// Payload of a successful login envelope.
#[derive(Debug, Deserialize)]
struct LoginPayload {
    token: Option<String>,
}

/// Holder of the single session credential.
pub struct SessionManager {
    client: ApiClient,
    store: Arc<dyn CredentialStore>,
    token: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            token: RwLock::new(None),
        }
    }

    /// The current in-memory token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// The underlying envelope client, for unauthenticated calls.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Populate the in-memory token from secure storage if absent.
    ///
    /// Idempotent and infallible: a storage failure is logged and
    /// swallowed, leaving the session logged out.
    pub fn recover_session(&self) {
        if self.is_logged_in() {
            return;
        }
        match self.store.get() {
            Ok(Some(token)) => {
                debug!("recovered session token from secure storage");
                *self.token.write().expect("token lock poisoned") = Some(token);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "session recovery failed"),
        }
    }

    /// Authenticate with the service.
    ///
    /// On success the returned token is persisted to secure storage and
    /// adopted in memory. A success envelope that carries no token is a
    /// server-error rejection, never a silent success; a persistence
    /// failure rejects with `TokenSave` and the session stays logged out.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), ApiRejection> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let payload: LoginPayload = self.client.post(AUTH_PATH, &body, None).await?;

        let Some(token) = payload.token else {
            debug!("login envelope carried no token");
            return Err(ApiRejection {
                status: RequestStatus::ServerError,
                code: None,
                message: Some("login response carried no token".into()),
            });
        };

        self.store.set(&token).map_err(ApiRejection::from)?;
        *self.token.write().expect("token lock poisoned") = Some(token);
        debug!("login successful");
        Ok(())
    }

    /// End the session.
    ///
    /// Best-effort: the in-memory token is always dropped first, so
    /// `is_logged_in()` is false on return regardless. A storage clear
    /// failure is reported for the caller to log.
    pub fn logout(&self) -> Result<(), StoreError> {
        *self.token.write().expect("token lock poisoned") = None;
        debug!("session ended");
        self.store.clear()
    }

    /// Send an authenticated request with the session token attached.
    ///
    /// With no token, rejects immediately with `TokenRetrieve` and makes
    /// no network call. Otherwise the token is merged into the JSON body
    /// (the server reads it there) and also sent as a bearer credential,
    /// and the envelope client's result passes through unchanged.
    ///
    /// `params` must be a JSON object (or null, standing in for an empty
    /// one); anything else cannot carry the token and rejects with
    /// `BadInput` before any network call.
    pub async fn authenticated_request<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &Value,
    ) -> Result<T, ApiRejection> {
        let Some(token) = self.token() else {
            return Err(ApiRejection::no_credential());
        };

        let mut body = params.clone();
        match body {
            Value::Object(ref mut map) => {
                map.insert("token".into(), Value::String(token.clone()));
            }
            Value::Null => {
                body = json!({ "token": token });
            }
            _ => {
                return Err(ApiRejection {
                    status: RequestStatus::BadInput,
                    code: None,
                    message: Some("request params must be a JSON object".into()),
                });
            }
        }

        self.client.post(path, &body, Some(&token)).await
    }
}
