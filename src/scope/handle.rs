//! Shared, async-safe handle to the scope state.
//!
//! Wraps `FactoryScope` behind `Arc<Mutex>` so every collaborator sees
//! one resolver per session, and publishes a [`ScopeSnapshot`] on a
//! `tokio::sync::watch` channel whenever the state changes. Collaborators
//! that cache tenant-scoped data subscribe and refetch when the resolved
//! factory id moves.
//!
//! `load` performs the list fetch outside the lock and applies the
//! multi-field assignment under it, so the transition appears atomic to
//! concurrent readers.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use crate::errors::ScopeError;

use super::models::{Factory, ScopeSnapshot, SessionIdentity};
use super::persist::ScopeSelection;
use super::resolver::FactoryScope;
use super::source::FactorySource;

#[derive(Clone)]
pub struct ScopeHandle {
    inner: Arc<Mutex<FactoryScope>>,
    tx: watch::Sender<ScopeSnapshot>,
}

impl Default for ScopeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeHandle {
    pub fn new() -> Self {
        let scope = FactoryScope::new();
        let (tx, _) = watch::channel(scope.snapshot());
        Self {
            inner: Arc::new(Mutex::new(scope)),
            tx,
        }
    }

    /// Login-time initialization. Must complete before any tenant-scoped
    /// fetch is issued; until it does, `resolve_factory_id` stays `None`.
    ///
    /// On fetch failure the resolver is left safely uninitialized and the
    /// error propagates to the caller; there is no automatic retry.
    pub async fn load(
        &self,
        identity: &SessionIdentity,
        source: &dyn FactorySource,
        restore: Option<&ScopeSelection>,
    ) -> Result<(), ScopeError> {
        {
            let mut scope = self.inner.lock().await;
            scope.begin_load();
            self.publish(&scope);
        }

        let factories = match source.fetch_active_factories().await {
            Ok(factories) => factories,
            Err(source) => {
                let mut scope = self.inner.lock().await;
                scope.fail_load();
                self.publish(&scope);
                return Err(ScopeError::FactoryListUnavailable { source });
            }
        };

        let mut scope = self.inner.lock().await;
        scope.apply_loaded(factories, identity, restore);
        self.publish(&scope);
        Ok(())
    }

    pub async fn set_active_factory(&self, factory_id: Uuid) {
        let mut scope = self.inner.lock().await;
        scope.set_active_factory(factory_id);
        self.publish(&scope);
    }

    pub async fn set_viewing_factory(&self, factory_id: Option<Uuid>) {
        let mut scope = self.inner.lock().await;
        scope.set_viewing_factory(factory_id);
        self.publish(&scope);
    }

    pub async fn reset(&self) {
        let mut scope = self.inner.lock().await;
        scope.reset();
        self.publish(&scope);
    }

    pub async fn resolve_factory_id(&self) -> Option<Uuid> {
        self.inner.lock().await.resolve_factory_id()
    }

    pub async fn require_factory_id(&self) -> Result<Uuid, ScopeError> {
        self.inner.lock().await.require_factory_id()
    }

    pub async fn snapshot(&self) -> ScopeSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn factories(&self) -> Vec<Factory> {
        self.inner.lock().await.factories().to_vec()
    }

    pub async fn selection(&self) -> ScopeSelection {
        self.inner.lock().await.selection()
    }

    /// Subscribe to scope changes. The receiver holds the latest
    /// snapshot; `changed().await` wakes only when the state actually
    /// moved.
    pub fn subscribe(&self) -> watch::Receiver<ScopeSnapshot> {
        self.tx.subscribe()
    }

    fn publish(&self, scope: &FactoryScope) {
        let next = scope.snapshot();
        self.tx.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}
