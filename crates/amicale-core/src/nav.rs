// ── Navigation seam ──
//
// The data layer never renders or routes; the single point where it
// drives navigation is the forced-logout redirect emitted here. The host
// UI subscribes and performs the actual screen change.

use tokio::sync::watch;

/// Request to open the login entry point, pre-seeded with the screen the
/// user was on so they can be returned to it after re-authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub next_screen: String,
}

/// Handle for emitting and observing login redirects.
#[derive(Clone)]
pub struct Navigator {
    tx: watch::Sender<Option<LoginRedirect>>,
}

impl Navigator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn redirect_to_login(&self, next_screen: &str) {
        self.tx.send_replace(Some(LoginRedirect {
            next_screen: next_screen.to_owned(),
        }));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LoginRedirect>> {
        self.tx.subscribe()
    }

    /// The most recent redirect, if one is pending.
    pub fn pending(&self) -> Option<LoginRedirect> {
        self.tx.borrow().clone()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
