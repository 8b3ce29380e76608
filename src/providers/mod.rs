//! Wallet provider discovery.
//!
//! Providers announce themselves to a store; observers subscribe and get the
//! full provider list on every change. Nothing here feeds frame or price
//! state.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::lock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub uuid: String,
    pub name: String,
    pub icon: String,
    pub rdns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetail {
    pub info: ProviderInfo,
}

pub type ProviderListener = Arc<dyn Fn(&[ProviderDetail]) + Send + Sync>;

/// Unsubscribes when dropped.
pub struct ProviderSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderSubscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

pub trait ProviderStore: Send + Sync {
    fn providers(&self) -> Vec<ProviderDetail>;

    fn subscribe(&self, listener: ProviderListener) -> ProviderSubscription;
}

#[derive(Default)]
struct StoreInner {
    providers: Vec<ProviderDetail>,
    listeners: Vec<(Uuid, ProviderListener)>,
}

/// In-memory announcement store, keyed by provider uuid.
#[derive(Clone, Default)]
pub struct AnnouncementStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl AnnouncementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        lock(&self.inner)
    }

    /// Records an announcement. A repeat announcement for a known uuid is
    /// ignored and does not notify.
    pub fn announce(&self, detail: ProviderDetail) -> bool {
        let (snapshot, listeners) = {
            let mut inner = self.lock();
            if inner
                .providers
                .iter()
                .any(|known| known.info.uuid == detail.info.uuid)
            {
                debug!("ignoring repeat announcement from {}", detail.info.rdns);
                return false;
            }
            inner.providers.push(detail);
            (inner.providers.clone(), listener_snapshot(&inner))
        };

        notify(&listeners, &snapshot);
        true
    }

    pub fn clear(&self) {
        let listeners = {
            let mut inner = self.lock();
            if inner.providers.is_empty() {
                return;
            }
            inner.providers.clear();
            listener_snapshot(&inner)
        };

        notify(&listeners, &[]);
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl ProviderStore for AnnouncementStore {
    fn providers(&self) -> Vec<ProviderDetail> {
        self.lock().providers.clone()
    }

    fn subscribe(&self, listener: ProviderListener) -> ProviderSubscription {
        let id = Uuid::new_v4();
        self.lock().listeners.push((id, listener));

        let inner: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);
        ProviderSubscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock(&inner)
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }
}

fn listener_snapshot(inner: &StoreInner) -> Vec<ProviderListener> {
    inner
        .listeners
        .iter()
        .map(|(_, listener)| Arc::clone(listener))
        .collect()
}

fn notify(listeners: &[ProviderListener], providers: &[ProviderDetail]) {
    for listener in listeners {
        listener(providers);
    }
}
