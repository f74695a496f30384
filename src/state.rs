use std::sync::Arc;

use tokio::sync::watch;

use crate::store::Store;

/// Demo credentials for the single hardcoded operator account. Not a
/// security mechanism; logging in only flips the session flag.
pub const DEMO_EMAIL: &str = "operator@surveysync.local";
pub const DEMO_PASSWORD: &str = "field-demo";

/// Process-wide session flags with an explicit lifecycle: probed at
/// startup, mutated by discrete user/environment actions. Reconciliation
/// fires only while all three hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub online: bool,
    pub authenticated: bool,
    pub store_ready: bool,
}

impl SessionFlags {
    pub fn sync_eligible(&self) -> bool {
        self.online && self.authenticated && self.store_ready
    }

    /// Derived reads may not touch storage before it is opened and the
    /// operator has signed in.
    pub fn reads_allowed(&self) -> bool {
        self.authenticated && self.store_ready
    }
}

/// Shared application context handed to the sync worker and the live
/// query layer instead of ambient globals.
#[derive(Clone)]
pub struct AppState {
    store: Store,
    flags: Arc<watch::Sender<SessionFlags>>,
}

impl AppState {
    pub fn new(store: Store, initial: SessionFlags) -> Self {
        let (flags, _) = watch::channel(initial);
        AppState {
            store,
            flags: Arc::new(flags),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn flags(&self) -> SessionFlags {
        *self.flags.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionFlags> {
        self.flags.subscribe()
    }

    /// Toggle the connectivity signal.
    pub fn set_online(&self, online: bool) {
        self.flags.send_modify(|flags| flags.online = online);
        tracing::info!(target: "surveysync", event = "connectivity_changed", online);
    }

    pub fn mark_store_ready(&self) {
        self.flags.send_modify(|flags| flags.store_ready = true);
    }

    /// Hardcoded credential check. Returns whether the session is now
    /// authenticated.
    pub fn login(&self, email: &str, password: &str) -> bool {
        let ok = email == DEMO_EMAIL && password == DEMO_PASSWORD;
        if ok {
            self.flags.send_modify(|flags| flags.authenticated = true);
            tracing::info!(target: "surveysync", event = "login");
        } else {
            tracing::warn!(target: "surveysync", event = "login_rejected");
        }
        ok
    }

    /// Clears the authenticated flag. Pending records stay queued; the
    /// next eligible session picks them up.
    pub fn logout(&self) {
        self.flags.send_modify(|flags| flags.authenticated = false);
        tracing::info!(target: "surveysync", event = "logout");
    }
}
