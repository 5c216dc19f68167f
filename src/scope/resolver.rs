//! The scope state machine.
//!
//! `FactoryScope` is a plain owned state object with an explicit
//! lifecycle: empty until the login-time load applies a factory list,
//! mutated only through the operations below, cleared on sign-out. It is
//! synchronous and infallible on its own; the async fetch and the shared
//! handle live in [`super::handle`].
//!
//! States per session:
//!
//! ```text
//! UNINITIALIZED --apply_loaded--> NORMAL(active=X, viewing=none)
//! UNINITIALIZED --fail_load-----> UNINITIALIZED
//! NORMAL --set_viewing_factory(Y != X)--> OBSERVING(active=X, viewing=Y)
//! OBSERVING --set_viewing_factory(None | X)--> NORMAL
//! NORMAL/OBSERVING --set_active_factory(Z)--> NORMAL(active=Z)
//! any --reset--> UNINITIALIZED
//! ```

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::ScopeError;

use super::models::{Factory, ScopeSnapshot, SessionIdentity};
use super::persist::ScopeSelection;

/// Session-scoped tenant selection: the factory list, the active
/// factory, and an optional viewing factory (observer mode).
///
/// Observer mode is derived, not stored: it is on exactly when
/// `viewing_factory` is set, and the mutation sites normalize self-view
/// away so the two can never disagree.
#[derive(Debug, Default)]
pub struct FactoryScope {
    factories: Vec<Factory>,
    active_factory: Option<Factory>,
    viewing_factory: Option<Factory>,
    initialized: bool,
    loading: bool,
}

impl FactoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a load. The initialized gate closes here, so a
    /// concurrent reader sees "not ready" rather than a stale selection.
    pub fn begin_load(&mut self) {
        self.initialized = false;
        self.loading = true;
    }

    /// Record a failed load. No partial state: the resolver stays
    /// uninitialized and dependent queries stay blocked.
    pub fn fail_load(&mut self) {
        self.loading = false;
    }

    /// Apply a freshly fetched factory list for the signed-in user.
    ///
    /// Chooses the active factory from the identity, clears any viewing
    /// state, re-applies a restored selection where it still makes
    /// sense, and only then opens the initialized gate.
    pub fn apply_loaded(
        &mut self,
        factories: Vec<Factory>,
        identity: &SessionIdentity,
        restore: Option<&ScopeSelection>,
    ) {
        self.factories = factories;
        self.active_factory = self.choose_active(identity);
        self.viewing_factory = None;
        if let Some(selection) = restore {
            self.restore_selection(selection, identity);
        }
        self.loading = false;
        self.initialized = true;
    }

    /// Default-selection policy for the active factory. Kept in one
    /// place so the policy can change without touching the load path.
    fn choose_active(&self, identity: &SessionIdentity) -> Option<Factory> {
        if identity.role.is_privileged_admin() {
            return self.factories.first().cloned();
        }
        match identity.assigned_factory_id {
            Some(assigned) => match self.find(assigned) {
                Some(factory) => Some(factory.clone()),
                None => {
                    error!(
                        user = %identity.user_id,
                        factory_id = %assigned,
                        "assigned factory not in loaded list, falling back to default"
                    );
                    self.factories.first().cloned()
                }
            },
            None => {
                warn!(
                    user = %identity.user_id,
                    "user has no factory assignment, defaulting to first factory"
                );
                self.factories.first().cloned()
            }
        }
    }

    /// Re-apply a selection persisted by a previous process. Only ids
    /// still present in the fresh list survive; a persisted active
    /// factory is only honored for privileged admins, since regular
    /// users cannot change theirs.
    fn restore_selection(&mut self, selection: &ScopeSelection, identity: &SessionIdentity) {
        if identity.role.is_privileged_admin() {
            if let Some(id) = selection.active_factory_id {
                match self.find(id).cloned() {
                    Some(factory) => self.active_factory = Some(factory),
                    None => debug!(factory_id = %id, "persisted active factory no longer listed"),
                }
            }
        }
        if let Some(id) = selection.viewing_factory_id {
            self.set_viewing_factory(Some(id));
        }
    }

    /// Replace the active factory. Privileged-admin operation; the role
    /// check is the caller's job. Clears any viewing state. Idempotent.
    pub fn set_active_factory(&mut self, factory_id: Uuid) {
        match self.find(factory_id).cloned() {
            Some(factory) => {
                self.active_factory = Some(factory);
                self.viewing_factory = None;
            }
            None => warn!(%factory_id, "ignoring active factory not in loaded list"),
        }
    }

    /// Enter or leave observer mode. `None` stops observing; so does the
    /// active factory's own id, which would otherwise leave observer
    /// mode "on" while viewing one's own plant.
    pub fn set_viewing_factory(&mut self, factory_id: Option<Uuid>) {
        let Some(id) = factory_id else {
            self.viewing_factory = None;
            return;
        };
        if self
            .active_factory
            .as_ref()
            .is_some_and(|active| active.factory_id == id)
        {
            self.viewing_factory = None;
            return;
        }
        match self.find(id).cloned() {
            Some(factory) => self.viewing_factory = Some(factory),
            None => warn!(factory_id = %id, "ignoring viewing factory not in loaded list"),
        }
    }

    /// The single sanctioned filter value for tenant-scoped queries.
    ///
    /// `None` means "not ready" (or no factory exists), never "no
    /// filter"; callers must defer their fetch rather than run unscoped.
    pub fn resolve_factory_id(&self) -> Option<Uuid> {
        if !self.initialized {
            warn!("factory scope consulted before initialization");
            return None;
        }
        self.resolved().map(|factory| factory.factory_id)
    }

    /// Strict variant for service code that must not run unscoped.
    pub fn require_factory_id(&self) -> Result<Uuid, ScopeError> {
        if !self.initialized {
            return Err(ScopeError::ScopeNotReady);
        }
        self.resolved()
            .map(|factory| factory.factory_id)
            .ok_or(ScopeError::NoFactoryResolved)
    }

    /// Short code of the resolved factory, used for reference-number
    /// generation (e.g. inbound slips prefixed "ALT-...").
    pub fn resolved_factory_code(&self) -> Option<&str> {
        if !self.initialized {
            return None;
        }
        self.resolved().map(|factory| factory.factory_code.as_str())
    }

    /// Clear everything back to the pre-login state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn active_factory(&self) -> Option<&Factory> {
        self.active_factory.as_ref()
    }

    pub fn viewing_factory(&self) -> Option<&Factory> {
        self.viewing_factory.as_ref()
    }

    pub fn is_observer_mode(&self) -> bool {
        self.viewing_factory.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The selection fields that survive a restart. The factory list and
    /// the initialized gate are deliberately not part of this.
    pub fn selection(&self) -> ScopeSelection {
        ScopeSelection {
            active_factory_id: self.active_factory.as_ref().map(|f| f.factory_id),
            viewing_factory_id: self.viewing_factory.as_ref().map(|f| f.factory_id),
        }
    }

    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            resolved_factory_id: if self.initialized {
                self.resolved().map(|factory| factory.factory_id)
            } else {
                None
            },
            active_factory: self.active_factory.clone(),
            viewing_factory: self.viewing_factory.clone(),
            observer_mode: self.is_observer_mode(),
            initialized: self.initialized,
        }
    }

    fn resolved(&self) -> Option<&Factory> {
        self.viewing_factory.as_ref().or(self.active_factory.as_ref())
    }

    fn find(&self, factory_id: Uuid) -> Option<&Factory> {
        self.factories
            .iter()
            .find(|factory| factory.factory_id == factory_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::models::UserRole;

    fn factory(code: &str) -> Factory {
        Factory::new(Uuid::new_v4(), code, &format!("{} Plant", code))
    }

    fn identity(role: UserRole, assigned: Option<Uuid>) -> SessionIdentity {
        SessionIdentity {
            user_id: "u-100".to_string(),
            assigned_factory_id: assigned,
            role,
        }
    }

    fn loaded(factories: Vec<Factory>, identity: &SessionIdentity) -> FactoryScope {
        let mut scope = FactoryScope::new();
        scope.begin_load();
        scope.apply_loaded(factories, identity, None);
        scope
    }

    #[test]
    fn uninitialized_scope_resolves_nothing() {
        let scope = FactoryScope::new();
        assert_eq!(scope.resolve_factory_id(), None);
        assert!(matches!(
            scope.require_factory_id(),
            Err(ScopeError::ScopeNotReady)
        ));
    }

    #[test]
    fn resolves_nothing_mid_load_even_with_stale_active() {
        let f1 = factory("F1");
        let id = identity(UserRole::SystemAdmin, None);
        let mut scope = loaded(vec![f1.clone()], &id);
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));

        // A re-login load closes the gate until it completes.
        scope.begin_load();
        assert_eq!(scope.resolve_factory_id(), None);
        assert!(scope.is_loading());
    }

    #[test]
    fn failed_load_leaves_scope_uninitialized() {
        let mut scope = FactoryScope::new();
        scope.begin_load();
        scope.fail_load();
        assert!(!scope.is_initialized());
        assert!(!scope.is_loading());
        assert_eq!(scope.resolve_factory_id(), None);
    }

    #[test]
    fn assigned_user_gets_their_factory() {
        let (f1, f2, f3) = (factory("F1"), factory("F2"), factory("F3"));
        let id = identity(UserRole::User, Some(f2.factory_id));
        let scope = loaded(vec![f1, f2.clone(), f3], &id);
        assert_eq!(scope.resolve_factory_id(), Some(f2.factory_id));
        assert!(!scope.is_observer_mode());
    }

    #[test]
    fn admin_defaults_to_first_and_can_switch() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::SystemAdmin, None);
        let mut scope = loaded(vec![f1.clone(), f2.clone()], &id);
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));

        scope.set_active_factory(f2.factory_id);
        assert_eq!(scope.resolve_factory_id(), Some(f2.factory_id));
        assert!(!scope.is_observer_mode());
    }

    #[test]
    fn missing_assignment_falls_back_to_first() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(Uuid::new_v4()));
        let scope = loaded(vec![f1.clone(), f2], &id);
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn unassigned_user_falls_back_to_first() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, None);
        let scope = loaded(vec![f1.clone(), f2], &id);
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn empty_factory_list_initializes_with_nothing_resolved() {
        let id = identity(UserRole::SystemAdmin, None);
        let scope = loaded(vec![], &id);
        assert!(scope.is_initialized());
        assert_eq!(scope.resolve_factory_id(), None);
        assert!(matches!(
            scope.require_factory_id(),
            Err(ScopeError::NoFactoryResolved)
        ));
    }

    #[test]
    fn observing_another_factory_sets_observer_mode() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1.clone(), f2.clone()], &id);

        scope.set_viewing_factory(Some(f2.factory_id));
        assert!(scope.is_observer_mode());
        assert_eq!(scope.resolve_factory_id(), Some(f2.factory_id));
        assert_eq!(scope.active_factory().unwrap().factory_id, f1.factory_id);
    }

    #[test]
    fn viewing_own_factory_is_not_observer_mode() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1.clone(), f2], &id);

        scope.set_viewing_factory(Some(f1.factory_id));
        assert!(!scope.is_observer_mode());
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn stop_observing_returns_to_active() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1.clone(), f2.clone()], &id);

        scope.set_viewing_factory(Some(f2.factory_id));
        scope.set_viewing_factory(None);
        assert!(!scope.is_observer_mode());
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn observer_mode_tracks_viewing_factory_across_mutations() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::SystemAdmin, None);
        let mut scope = loaded(vec![f1.clone(), f2.clone()], &id);

        scope.set_viewing_factory(Some(f2.factory_id));
        assert!(scope.is_observer_mode());

        // Switching the active factory always drops observer mode.
        scope.set_active_factory(f2.factory_id);
        assert!(!scope.is_observer_mode());
        assert_eq!(scope.viewing_factory(), None);
    }

    #[test]
    fn unknown_viewing_factory_is_ignored() {
        let f1 = factory("F1");
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1.clone()], &id);

        scope.set_viewing_factory(Some(Uuid::new_v4()));
        assert!(!scope.is_observer_mode());
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn unknown_active_factory_is_ignored() {
        let f1 = factory("F1");
        let id = identity(UserRole::SystemAdmin, None);
        let mut scope = loaded(vec![f1.clone()], &id);

        scope.set_active_factory(Uuid::new_v4());
        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn admin_switches_then_observes_fourth_factory() {
        let (f1, f2, f3, f4) = (factory("F1"), factory("F2"), factory("F3"), factory("F4"));
        let id = identity(UserRole::SystemAdmin, None);
        let mut scope = loaded(vec![f1, f2.clone(), f3.clone(), f4.clone()], &id);

        scope.set_active_factory(f2.factory_id);
        scope.set_active_factory(f3.factory_id);
        scope.set_active_factory(f3.factory_id); // idempotent
        scope.set_viewing_factory(Some(f4.factory_id));

        assert_eq!(scope.active_factory().unwrap().factory_id, f3.factory_id);
        assert!(scope.is_observer_mode());
        assert_eq!(scope.resolve_factory_id(), Some(f4.factory_id));
    }

    #[test]
    fn reset_clears_everything() {
        let f1 = factory("F1");
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1], &id);

        scope.reset();
        assert!(!scope.is_initialized());
        assert_eq!(scope.resolve_factory_id(), None);
        assert!(scope.factories().is_empty());
    }

    #[test]
    fn resolved_factory_code_follows_viewing() {
        let (f1, f2) = (factory("ALT"), factory("ALV"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1, f2.clone()], &id);
        assert_eq!(scope.resolved_factory_code(), Some("ALT"));

        scope.set_viewing_factory(Some(f2.factory_id));
        assert_eq!(scope.resolved_factory_code(), Some("ALV"));
    }

    #[test]
    fn selection_captures_only_ids() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let mut scope = loaded(vec![f1.clone(), f2.clone()], &id);
        scope.set_viewing_factory(Some(f2.factory_id));

        let selection = scope.selection();
        assert_eq!(selection.active_factory_id, Some(f1.factory_id));
        assert_eq!(selection.viewing_factory_id, Some(f2.factory_id));
    }

    #[test]
    fn restore_reapplies_admin_selection() {
        let (f1, f2, f3) = (factory("F1"), factory("F2"), factory("F3"));
        let id = identity(UserRole::SystemAdmin, None);
        let selection = ScopeSelection {
            active_factory_id: Some(f2.factory_id),
            viewing_factory_id: Some(f3.factory_id),
        };

        let mut scope = FactoryScope::new();
        scope.begin_load();
        scope.apply_loaded(vec![f1, f2.clone(), f3.clone()], &id, Some(&selection));

        assert_eq!(scope.active_factory().unwrap().factory_id, f2.factory_id);
        assert_eq!(scope.resolve_factory_id(), Some(f3.factory_id));
        assert!(scope.is_observer_mode());
    }

    #[test]
    fn restore_ignores_active_for_regular_user() {
        let (f1, f2) = (factory("F1"), factory("F2"));
        let id = identity(UserRole::User, Some(f1.factory_id));
        let selection = ScopeSelection {
            active_factory_id: Some(f2.factory_id),
            viewing_factory_id: None,
        };

        let mut scope = FactoryScope::new();
        scope.begin_load();
        scope.apply_loaded(vec![f1.clone(), f2], &id, Some(&selection));

        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
    }

    #[test]
    fn restore_drops_ids_no_longer_listed() {
        let (f1, gone) = (factory("F1"), factory("F9"));
        let id = identity(UserRole::SystemAdmin, None);
        let selection = ScopeSelection {
            active_factory_id: Some(gone.factory_id),
            viewing_factory_id: Some(gone.factory_id),
        };

        let mut scope = FactoryScope::new();
        scope.begin_load();
        scope.apply_loaded(vec![f1.clone()], &id, Some(&selection));

        assert_eq!(scope.resolve_factory_id(), Some(f1.factory_id));
        assert!(!scope.is_observer_mode());
    }
}
