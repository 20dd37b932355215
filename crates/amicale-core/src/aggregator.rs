// ── Multi-request aggregator ──
//
// For screens that need several independent authenticated calls before
// anything meaningful can render. Descriptors fan out concurrently with
// per-slot results (no short-circuit); overall validity is decided by the
// `mandatory` flag. Exposes the same three-way render contract as
// `RequestBoundary`, so callers can treat the two interchangeably.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use amicale_api::{ApiCode, ApiRejection, RequestStatus, SessionManager};

use crate::boundary::RenderState;
use crate::nav::Navigator;
use crate::present::{ErrorOverride, display_for};

/// One named request in a batch. Constructed once per screen, immutable.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub path: String,
    pub params: Value,
    /// A mandatory request's failure invalidates the whole batch;
    /// a non-mandatory failure just leaves its slot empty.
    pub mandatory: bool,
}

impl RequestDescriptor {
    pub fn mandatory(path: impl Into<String>, params: Value) -> Self {
        Self {
            path: path.into(),
            params,
            mandatory: true,
        }
    }

    pub fn optional(path: impl Into<String>, params: Value) -> Self {
        Self {
            path: path.into(),
            params,
            mandatory: false,
        }
    }
}

/// Observable batch state. `slots` and `errors` are index-aligned with
/// the descriptor list.
#[derive(Debug, Clone)]
pub struct AggregateState {
    pub loading: bool,
    /// True once every descriptor has either resolved or rejected.
    pub settled: bool,
    pub slots: Vec<Option<Value>>,
    pub errors: Vec<Option<ApiRejection>>,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Configuration for an aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Name of the owning screen, carried on a forced-logout redirect.
    pub screen: String,
    pub error_overrides: Vec<ErrorOverride>,
}

impl AggregatorConfig {
    pub fn new(screen: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            error_overrides: Vec::new(),
        }
    }
}

/// Parallel fan-out of several authenticated requests behind one
/// loading/error/success contract.
#[derive(Clone)]
pub struct MultiRequestAggregator {
    inner: Arc<AggregatorInner>,
}

struct AggregatorInner {
    session: Arc<SessionManager>,
    navigator: Navigator,
    config: AggregatorConfig,
    requests: Vec<RequestDescriptor>,
    state: watch::Sender<AggregateState>,
    /// Token identity captured at the last fetch; `None` until the first
    /// fetch. Used to re-fire the batch when the session changes.
    fetched_token: Mutex<Option<Option<String>>>,
}

impl MultiRequestAggregator {
    pub fn new(
        session: Arc<SessionManager>,
        navigator: Navigator,
        config: AggregatorConfig,
        requests: Vec<RequestDescriptor>,
    ) -> Self {
        let slots = requests.len();
        let (state, _) = watch::channel(AggregateState {
            loading: true,
            settled: false,
            slots: vec![None; slots],
            errors: vec![None; slots],
            last_refresh: None,
        });
        Self {
            inner: Arc::new(AggregatorInner {
                session,
                navigator,
                config,
                requests,
                state,
                fetched_token: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> AggregateState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.inner.state.subscribe()
    }

    /// Fire the whole batch concurrently and settle the state once every
    /// slot finished. With no session, every slot fails with the
    /// invalid-credential code and no network call is made.
    pub async fn fetch(&self) {
        let inner = &self.inner;
        inner.state.send_modify(|s| s.loading = true);
        *inner
            .fetched_token
            .lock()
            .expect("fetched token lock poisoned") = Some(inner.session.token());

        let (slots, errors): (Vec<_>, Vec<_>) = if inner.session.is_logged_in() {
            let calls = inner.requests.iter().map(|descriptor| {
                inner
                    .session
                    .authenticated_request::<Value>(&descriptor.path, &descriptor.params)
            });
            join_all(calls)
                .await
                .into_iter()
                .map(|result| match result {
                    Ok(value) => (Some(value), None),
                    Err(rejection) => (None, Some(rejection)),
                })
                .unzip()
        } else {
            debug!(screen = %inner.config.screen, "batch fired without a session");
            let rejection = ApiRejection {
                status: RequestStatus::TokenRetrieve,
                code: Some(ApiCode::BadToken),
                message: None,
            };
            let n = inner.requests.len();
            (vec![None; n], vec![Some(rejection); n])
        };

        let critical = inner
            .requests
            .iter()
            .zip(&errors)
            .any(|(descriptor, error)| {
                descriptor.mandatory
                    && error.as_ref().is_some_and(ApiRejection::is_critical)
            });

        inner.state.send_modify(|s| {
            s.loading = false;
            s.settled = true;
            s.slots = slots;
            s.errors = errors;
            s.last_refresh = Some(Utc::now());
        });

        if critical {
            self.force_logout();
        }
    }

    /// Screen came into focus: re-fire the batch if the active session
    /// token differs from the one captured at the last fetch.
    pub async fn on_focus(&self) {
        let changed = {
            let fetched = self
                .inner
                .fetched_token
                .lock()
                .expect("fetched token lock poisoned");
            fetched
                .as_ref()
                .is_none_or(|token| *token != self.inner.session.token())
        };
        if changed {
            self.fetch().await;
        }
    }

    /// True once settled with no mandatory slot rejected. Non-mandatory
    /// rejections are tolerated; their slots stay `None`.
    pub fn is_valid(&self) -> bool {
        let state = self.inner.state.borrow();
        state.settled && self.blocking_error(&state).is_none()
    }

    /// Same contract as [`RequestBoundary::view`]: loading until settled,
    /// error when a mandatory slot rejected, otherwise the slot vector.
    pub fn view(&self) -> RenderState<Vec<Option<Value>>> {
        let state = self.inner.state.borrow().clone();
        if state.loading || !state.settled {
            return RenderState::Loading;
        }
        if let Some(rejection) = self.blocking_error(&state) {
            return RenderState::Error(display_for(
                &rejection,
                &self.inner.config.error_overrides,
            ));
        }
        RenderState::Ready {
            data: Some(Arc::new(state.slots)),
            loading: false,
            last_refresh: state.last_refresh,
        }
    }

    fn blocking_error(&self, state: &AggregateState) -> Option<ApiRejection> {
        self.inner
            .requests
            .iter()
            .zip(&state.errors)
            .find_map(|(descriptor, error)| {
                if descriptor.mandatory {
                    error.clone()
                } else {
                    None
                }
            })
    }

    /// Same forced-logout path as the boundary.
    fn force_logout(&self) {
        warn!(screen = %self.inner.config.screen, "mandatory request rejected the credential, forcing logout");
        if let Err(e) = self.inner.session.logout() {
            warn!(error = %e, "credential clear failed during forced logout");
        }
        self.inner
            .navigator
            .redirect_to_login(&self.inner.config.screen);
    }
}
