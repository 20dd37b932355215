// ── Screen-level request boundary ──
//
// Wraps a `RequestLifecycle` with the concerns every screen shares:
// refresh-on-focus, an optional auto-refresh timer scoped to activation,
// critical-error interception (forced logout + login redirect), and the
// three-way loading/error/success render contract. Screens never touch
// transport errors -- they consume `RenderState` and nothing else.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use amicale_api::SessionManager;

use crate::lifecycle::{LifecyclePhase, Refresh, RequestLifecycle};
use crate::nav::Navigator;
use crate::present::{ErrorDisplay, ErrorOverride, display_for};

/// Screen-level options for a boundary.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    /// Name of the owning screen, carried on a forced-logout redirect.
    pub screen: String,
    /// Refresh on every activation (default). Disable when a seeded
    /// cache should be shown without hitting the network on focus.
    pub refresh_on_focus: bool,
    /// Arm a repeating refresh timer while activated.
    pub auto_refresh: Option<Duration>,
    /// Render the loading view while the first load is in flight.
    pub show_loading: bool,
    /// Render the error view on a blocking failure.
    pub show_error: bool,
    pub error_overrides: Vec<ErrorOverride>,
}

impl BoundaryConfig {
    pub fn new(screen: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            refresh_on_focus: true,
            auto_refresh: None,
            show_loading: true,
            show_error: true,
            error_overrides: Vec::new(),
        }
    }
}

/// The three-way render contract. The UI layer is a pure function from
/// this state to a view.
#[derive(Debug, Clone)]
pub enum RenderState<T> {
    Loading,
    Error(ErrorDisplay),
    Ready {
        data: Option<Arc<T>>,
        loading: bool,
        last_refresh: Option<DateTime<Utc>>,
    },
}

/// Screen boundary around one request lifecycle.
///
/// Cheaply cloneable; clones share the lifecycle and timer scope.
#[derive(Clone)]
pub struct RequestBoundary<T> {
    inner: Arc<BoundaryInner<T>>,
}

struct BoundaryInner<T> {
    lifecycle: RequestLifecycle<T>,
    session: Arc<SessionManager>,
    navigator: Navigator,
    config: BoundaryConfig,
    timer_scope: Mutex<Option<CancellationToken>>,
}

impl<T: Send + Sync + 'static> RequestBoundary<T> {
    pub fn new(
        lifecycle: RequestLifecycle<T>,
        session: Arc<SessionManager>,
        navigator: Navigator,
        config: BoundaryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(BoundaryInner {
                lifecycle,
                session,
                navigator,
                config,
                timer_scope: Mutex::new(None),
            }),
        }
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<T> {
        &self.inner.lifecycle
    }

    /// Manual refresh entry point (pull-to-refresh, retry button).
    /// Throttled by the underlying lifecycle.
    pub async fn refresh(&self) -> Refresh {
        let outcome = self.inner.lifecycle.refresh().await;
        self.intercept_critical();
        outcome
    }

    /// Screen came into focus: refresh (unless suppressed) and arm the
    /// auto-refresh timer. Re-activation replaces any previous timer.
    pub async fn activate(&self) {
        if self.inner.config.refresh_on_focus {
            self.refresh().await;
        }

        if let Some(every) = self.inner.config.auto_refresh {
            let scope = CancellationToken::new();
            let previous = self
                .inner
                .timer_scope
                .lock()
                .expect("timer scope lock poisoned")
                .replace(scope.clone());
            if let Some(previous) = previous {
                previous.cancel();
            }
            // weak handle: the timer must not keep the boundary alive
            let inner = Arc::downgrade(&self.inner);
            tokio::spawn(auto_refresh_task(inner, every, scope));
        }
    }

    /// Screen left focus: stop scheduling further refreshes. Requests
    /// already in flight are not aborted; their resolution lands in the
    /// lifecycle state where nothing reads it until reactivation.
    pub fn deactivate(&self) {
        let scope = self
            .inner
            .timer_scope
            .lock()
            .expect("timer scope lock poisoned")
            .take();
        if let Some(scope) = scope {
            debug!(screen = %self.inner.config.screen, "auto-refresh disarmed");
            scope.cancel();
        }
    }

    /// Resolve the current render state, in priority order: loading,
    /// then blocking error, then the caller's success view.
    pub fn view(&self) -> RenderState<T> {
        let state = self.inner.lifecycle.state();
        let loading = state.is_loading();

        if state.data.is_none() {
            match &state.phase {
                LifecyclePhase::Idle | LifecyclePhase::Loading
                    if self.inner.config.show_loading =>
                {
                    return RenderState::Loading;
                }
                LifecyclePhase::Error(rejection) if self.inner.config.show_error => {
                    return RenderState::Error(display_for(
                        rejection,
                        &self.inner.config.error_overrides,
                    ));
                }
                _ => {}
            }
        }

        RenderState::Ready {
            data: state.data,
            loading,
            last_refresh: state.last_refresh,
        }
    }

    /// Forced-logout path: an invalid/expired credential is never just
    /// displayed. The session is ended and the login entry point is
    /// requested, seeded with this screen's name.
    fn intercept_critical(&self) {
        let state = self.inner.lifecycle.state();
        let Some(rejection) = state.rejection() else {
            return;
        };
        if !rejection.is_critical() {
            return;
        }

        warn!(screen = %self.inner.config.screen, "session credential rejected, forcing logout");
        if let Err(e) = self.inner.session.logout() {
            warn!(error = %e, "credential clear failed during forced logout");
        }
        self.inner
            .navigator
            .redirect_to_login(&self.inner.config.screen);
    }
}

impl<T> Drop for BoundaryInner<T> {
    fn drop(&mut self) {
        // Scope guard: the timer dies with its owner.
        if let Ok(mut scope) = self.timer_scope.lock() {
            if let Some(scope) = scope.take() {
                scope.cancel();
            }
        }
    }
}

/// Repeating refresh while the owning scope lives. Each tick goes
/// through the boundary so critical errors are still intercepted.
/// Holds only a weak handle: when the last user handle is dropped the
/// upgrade fails and the task exits on its own.
async fn auto_refresh_task<T: Send + Sync + 'static>(
    inner: Weak<BoundaryInner<T>>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                RequestBoundary { inner }.refresh().await;
            }
        }
    }
}
