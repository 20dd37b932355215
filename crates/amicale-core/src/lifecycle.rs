// ── Per-request lifecycle state machine ──
//
// One instance per call site. Drives a zero-argument request function
// through Idle -> Loading -> Success/Error, with a minimum-interval
// refresh throttle and stale-while-revalidate data retention. State is
// broadcast through a `watch` channel so consumers observe transitions
// without polling.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::watch;
use tracing::{debug, trace};

use amicale_api::ApiRejection;

/// Default throttle window: long enough to absorb duplicate triggers from
/// rapid focus/blur cycles, short enough not to hurt pull-to-refresh.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(3);

/// A zero-argument request producing a payload or a normalized rejection.
pub type RequestFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiRejection>> + Send + Sync>;

type CacheUpdateFn<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

/// Wrap an async closure into a [`RequestFn`].
pub fn request_fn<T, F, Fut>(f: F) -> RequestFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiRejection>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Where the lifecycle currently is. The rejection is retained in
/// `Error` so downstream layers can branch on the domain code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing dispatched yet (possibly showing seeded cache data).
    Idle,
    Loading,
    Success,
    Error(ApiRejection),
}

/// Observable lifecycle state. Mutated only by the lifecycle itself;
/// read-only to consumers.
#[derive(Debug)]
pub struct LifecycleState<T> {
    pub phase: LifecyclePhase,
    /// Last successful payload. Retained across failures.
    pub data: Option<Arc<T>>,
    /// Stamped when a request is dispatched, not when it resolves.
    pub last_refresh: Option<DateTime<Utc>>,
}

// Manual impl: the derive would require `T: Clone`, but `Arc<T>` clones
// without it.
impl<T> Clone for LifecycleState<T> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase.clone(),
            data: self.data.clone(),
            last_refresh: self.last_refresh,
        }
    }
}

impl<T> LifecycleState<T> {
    pub fn is_loading(&self) -> bool {
        self.phase == LifecyclePhase::Loading
    }

    pub fn rejection(&self) -> Option<&ApiRejection> {
        match &self.phase {
            LifecyclePhase::Error(rej) => Some(rej),
            _ => None,
        }
    }
}

/// Outcome of a `refresh` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Dispatched,
    /// Within the throttle window; nothing was dispatched and state was
    /// not touched.
    Throttled,
}

/// Generic per-call-site request state machine.
pub struct RequestLifecycle<T> {
    request: RequestFn<T>,
    state: watch::Sender<LifecycleState<T>>,
    throttle: Duration,
    last_dispatch: Mutex<Option<Instant>>,
    on_cache_update: Option<CacheUpdateFn<T>>,
}

impl<T: Send + Sync + 'static> RequestLifecycle<T> {
    pub fn new(request: RequestFn<T>) -> Self {
        let (state, _) = watch::channel(LifecycleState {
            phase: LifecyclePhase::Idle,
            data: None,
            last_refresh: None,
        });
        Self {
            request,
            state,
            throttle: MIN_REFRESH_INTERVAL,
            last_dispatch: Mutex::new(None),
            on_cache_update: None,
        }
    }

    /// Seed a cached payload: shown immediately, the lifecycle starts
    /// `Idle` instead of waiting on a first load.
    pub fn with_cache(self, cache: T) -> Self {
        self.state.send_modify(|s| s.data = Some(Arc::new(cache)));
        self
    }

    pub fn with_throttle(mut self, window: Duration) -> Self {
        self.throttle = window;
        self
    }

    /// Register a callback fired with each new successful payload, so the
    /// caller can persist it beyond this lifecycle's lifetime.
    pub fn on_cache_update(mut self, callback: impl Fn(&Arc<T>) + Send + Sync + 'static) -> Self {
        self.on_cache_update = Some(Arc::new(callback));
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LifecycleState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState<T>> {
        self.state.subscribe()
    }

    /// Throttled refresh using the configured request function.
    pub async fn refresh(&self) -> Refresh {
        self.dispatch(Arc::clone(&self.request)).await
    }

    /// Throttled refresh with a different underlying request, keeping the
    /// throttle bookkeeping of this lifecycle.
    pub async fn refresh_with(&self, request: RequestFn<T>) -> Refresh {
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: RequestFn<T>) -> Refresh {
        {
            let mut last = self.last_dispatch.lock().expect("throttle lock poisoned");
            if let Some(at) = *last {
                if at.elapsed() < self.throttle {
                    trace!("refresh throttled");
                    return Refresh::Throttled;
                }
            }
            // Stamped at dispatch, not at resolution.
            *last = Some(Instant::now());
        }

        let dispatched_at = Utc::now();
        self.state.send_modify(|s| {
            s.phase = LifecyclePhase::Loading;
            s.last_refresh = Some(dispatched_at);
        });

        // Overlapping refreshes are not cancelled; whichever resolves
        // last in wall-clock order wins.
        match request().await {
            Ok(payload) => {
                let payload = Arc::new(payload);
                if let Some(callback) = &self.on_cache_update {
                    callback(&payload);
                }
                self.state.send_modify(|s| {
                    s.phase = LifecyclePhase::Success;
                    s.data = Some(Arc::clone(&payload));
                });
            }
            Err(rejection) => {
                debug!(status = ?rejection.status, code = ?rejection.code, "refresh failed");
                // Previous data is retained: stale-while-revalidate.
                self.state
                    .send_modify(|s| s.phase = LifecyclePhase::Error(rejection));
            }
        }
        Refresh::Dispatched
    }
}
