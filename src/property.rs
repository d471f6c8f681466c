// src/property.rs
use crate::remote::{PricingApi, Property, PropertySnapshot, RemoteError};
use crate::store::{
    read_or_absent, write_or_log, KeyValueStore, SELECTED_PROPERTY_ID_KEY, SELECTED_PROPERTY_KEY,
};

/// Outcome of resolving the active property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The cached or confirmed selection stands.
    Selected(String),
    /// A candidate was promoted; the caller should navigate to it.
    Redirect(String),
    /// No selection yet and the candidate list has not arrived.
    Awaiting,
    /// No selection and the candidate list could not be fetched.
    Unavailable,
    /// The user owns no properties. Offer to create one.
    NoProperty,
}

impl Resolution {
    pub fn property_id(&self) -> Option<&str> {
        match self {
            Resolution::Selected(id) | Resolution::Redirect(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidates {
    NotLoaded,
    Failed,
    Empty,
    Loaded,
}

/// Decides which property the session operates on.
///
/// A cached selection is trusted without a round trip. Once the owned
/// property list arrives it either confirms the selection or promotes its
/// first entry, and that happens at most once per resolver.
#[derive(Debug)]
pub struct PropertyResolver {
    selected: Option<String>,
    snapshot: Option<PropertySnapshot>,
    candidates: Candidates,
    settled: bool,
}

impl PropertyResolver {
    pub fn new<S: KeyValueStore>(store: &S) -> Self {
        let selected: Option<String> = read_or_absent(store, SELECTED_PROPERTY_ID_KEY);
        let snapshot: Option<PropertySnapshot> = read_or_absent(store, SELECTED_PROPERTY_KEY);
        // A snapshot for some other property is worthless.
        let snapshot = snapshot.filter(|s| Some(&s.id) == selected.as_ref());

        Self {
            selected,
            snapshot,
            candidates: Candidates::NotLoaded,
            settled: false,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn snapshot(&self) -> Option<&PropertySnapshot> {
        self.snapshot.as_ref()
    }

    /// True once promotion can no longer happen.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn resolve(&self) -> Resolution {
        if let Some(id) = &self.selected {
            return Resolution::Selected(id.clone());
        }
        match self.candidates {
            Candidates::NotLoaded => Resolution::Awaiting,
            Candidates::Failed => Resolution::Unavailable,
            Candidates::Empty => Resolution::NoProperty,
            // Unreachable in practice: a non-empty list always leaves a selection.
            Candidates::Loaded => Resolution::Awaiting,
        }
    }

    /// Fetches the owned properties and reconciles them with the selection.
    pub fn refresh<S, A>(&mut self, store: &S, api: &A, user_id: &str) -> Resolution
    where
        S: KeyValueStore,
        A: PricingApi,
    {
        let result = api.properties(user_id);
        self.apply_candidates(store, result)
    }

    /// Reconciles a candidate list (newest first) with the selection.
    ///
    /// Promotion of the first candidate runs at most once. Later lists, such
    /// as a refetch after the user moved elsewhere, leave the selection alone.
    pub fn apply_candidates<S: KeyValueStore>(
        &mut self,
        store: &S,
        result: Result<Vec<Property>, RemoteError>,
    ) -> Resolution {
        let candidates = match result {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "property list unavailable");
                if self.candidates == Candidates::NotLoaded {
                    self.candidates = Candidates::Failed;
                }
                return self.resolve();
            }
        };

        if self.settled {
            tracing::debug!(count = candidates.len(), "selection settled, ignoring refreshed list");
            return self.resolve();
        }

        let Some(first) = candidates.first() else {
            self.candidates = Candidates::Empty;
            if let Some(stale) = self.selected.take() {
                tracing::info!(
                    property_id = %stale,
                    "dropping cached selection, user owns no properties"
                );
                self.snapshot = None;
                remove_or_log(store, SELECTED_PROPERTY_ID_KEY);
                remove_or_log(store, SELECTED_PROPERTY_KEY);
            }
            return Resolution::NoProperty;
        };

        self.candidates = Candidates::Loaded;
        self.settled = true;

        if let Some(id) = &self.selected {
            if let Some(current) = candidates.iter().find(|p| &p.id == id) {
                let snapshot = PropertySnapshot::from(current);
                if self.snapshot.as_ref() != Some(&snapshot) {
                    write_or_log(store, SELECTED_PROPERTY_KEY, &snapshot);
                    self.snapshot = Some(snapshot);
                }
                return Resolution::Selected(id.clone());
            }
            tracing::info!(property_id = %id, "cached selection no longer owned");
        }

        let snapshot = PropertySnapshot::from(first);
        self.select(store, &first.id, Some(snapshot));
        tracing::info!(property_id = %first.id, "promoted newest property");
        Resolution::Redirect(first.id.clone())
    }

    /// Records a user-initiated switch. Also ends any pending promotion.
    pub fn navigate<S: KeyValueStore>(
        &mut self,
        store: &S,
        property_id: &str,
        snapshot: Option<PropertySnapshot>,
    ) {
        self.settled = true;
        if self.selected.as_deref() == Some(property_id) && snapshot.is_none() {
            return;
        }
        tracing::debug!(property_id, "navigated to property");
        self.select(store, property_id, snapshot);
    }

    fn select<S: KeyValueStore>(
        &mut self,
        store: &S,
        property_id: &str,
        snapshot: Option<PropertySnapshot>,
    ) {
        self.selected = Some(property_id.to_string());
        write_or_log(store, SELECTED_PROPERTY_ID_KEY, &property_id);

        let snapshot = snapshot.filter(|s| s.id == property_id);
        match &snapshot {
            Some(s) => write_or_log(store, SELECTED_PROPERTY_KEY, s),
            None => remove_or_log(store, SELECTED_PROPERTY_KEY),
        }
        self.snapshot = snapshot;
    }
}

fn remove_or_log<S: KeyValueStore>(store: &S, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to clear cache entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tests::utils::property;
    use serde_json::json;

    fn listing() -> Vec<Property> {
        vec![property("newest", "Harbor Inn"), property("older", "Old Mill")]
    }

    #[test]
    fn cached_selection_resolves_immediately() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("older")).unwrap();

        let r = PropertyResolver::new(&store);
        assert_eq!(r.resolve(), Resolution::Selected("older".into()));
        assert!(!r.is_settled());
    }

    #[test]
    fn without_cache_waits_for_candidates() {
        let store = MemoryStore::new();
        assert_eq!(PropertyResolver::new(&store).resolve(), Resolution::Awaiting);
    }

    #[test]
    fn promotes_first_candidate_and_persists() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);

        let res = r.apply_candidates(&store, Ok(listing()));

        assert_eq!(res, Resolution::Redirect("newest".into()));
        assert_eq!(r.selected(), Some("newest"));
        assert_eq!(store.get(SELECTED_PROPERTY_ID_KEY).unwrap(), Some(json!("newest")));
        assert_eq!(
            store.get(SELECTED_PROPERTY_KEY).unwrap(),
            Some(json!({"id": "newest", "name": "Harbor Inn"}))
        );
    }

    #[test]
    fn promotion_is_idempotent() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);

        r.apply_candidates(&store, Ok(listing()));
        let second = r.apply_candidates(&store, Ok(listing()));

        assert_eq!(second, Resolution::Selected("newest".into()));
        assert_eq!(store.get(SELECTED_PROPERTY_ID_KEY).unwrap(), Some(json!("newest")));
    }

    #[test]
    fn refetch_does_not_relocate_after_navigation() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);
        r.apply_candidates(&store, Ok(listing()));

        r.navigate(&store, "older", None);
        let mut refreshed = listing();
        refreshed.insert(0, property("brand-new", "Sky Lodge"));
        let res = r.apply_candidates(&store, Ok(refreshed));

        assert_eq!(res, Resolution::Selected("older".into()));
        assert_eq!(store.get(SELECTED_PROPERTY_ID_KEY).unwrap(), Some(json!("older")));
    }

    #[test]
    fn cached_selection_confirmed_by_list_is_kept() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("older")).unwrap();
        let mut r = PropertyResolver::new(&store);

        let res = r.apply_candidates(&store, Ok(listing()));

        assert_eq!(res, Resolution::Selected("older".into()));
        assert!(r.is_settled());
        assert_eq!(r.snapshot().map(|s| s.name.as_str()), Some("Old Mill"));
    }

    #[test]
    fn stale_cached_selection_is_replaced_once() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("sold-off")).unwrap();
        let mut r = PropertyResolver::new(&store);

        assert_eq!(
            r.apply_candidates(&store, Ok(listing())),
            Resolution::Redirect("newest".into())
        );
        assert_eq!(
            r.apply_candidates(&store, Ok(vec![property("other", "Elsewhere")])),
            Resolution::Selected("newest".into())
        );
    }

    #[test]
    fn empty_list_means_no_property() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);

        assert_eq!(r.apply_candidates(&store, Ok(vec![])), Resolution::NoProperty);
        assert_eq!(r.resolve(), Resolution::NoProperty);
        assert!(!r.is_settled());

        // The first property created later is still promoted.
        assert_eq!(
            r.apply_candidates(&store, Ok(vec![property("first", "First Hotel")])),
            Resolution::Redirect("first".into())
        );
    }

    #[test]
    fn empty_list_clears_stale_cache() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("gone")).unwrap();
        store
            .set(SELECTED_PROPERTY_KEY, &json!({"id": "gone", "name": "Gone"}))
            .unwrap();
        let mut r = PropertyResolver::new(&store);

        assert_eq!(r.apply_candidates(&store, Ok(vec![])), Resolution::NoProperty);
        assert_eq!(store.get(SELECTED_PROPERTY_ID_KEY).unwrap(), None);
        assert_eq!(store.get(SELECTED_PROPERTY_KEY).unwrap(), None);
    }

    #[test]
    fn list_failure_keeps_cached_selection() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("older")).unwrap();
        let mut r = PropertyResolver::new(&store);

        let res = r.apply_candidates(&store, Err(RemoteError::Unavailable("timeout".into())));
        assert_eq!(res, Resolution::Selected("older".into()));
    }

    #[test]
    fn list_failure_without_cache_is_unavailable() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);

        let res = r.apply_candidates(&store, Err(RemoteError::Unavailable("timeout".into())));
        assert_eq!(res, Resolution::Unavailable);

        // A later successful fetch still resolves.
        assert_eq!(
            r.apply_candidates(&store, Ok(listing())),
            Resolution::Redirect("newest".into())
        );
    }

    #[test]
    fn mismatched_snapshot_is_ignored_on_load() {
        let store = MemoryStore::new();
        store.set(SELECTED_PROPERTY_ID_KEY, &json!("a")).unwrap();
        store
            .set(SELECTED_PROPERTY_KEY, &json!({"id": "b", "name": "B"}))
            .unwrap();

        assert!(PropertyResolver::new(&store).snapshot().is_none());
    }

    #[test]
    fn navigate_persists_snapshot_for_new_property() {
        let store = MemoryStore::new();
        let mut r = PropertyResolver::new(&store);

        r.navigate(
            &store,
            "p9",
            Some(PropertySnapshot {
                id: "p9".into(),
                name: "Nine".into(),
            }),
        );
        assert_eq!(store.get(SELECTED_PROPERTY_ID_KEY).unwrap(), Some(json!("p9")));
        assert_eq!(
            store.get(SELECTED_PROPERTY_KEY).unwrap(),
            Some(json!({"id": "p9", "name": "Nine"}))
        );

        r.navigate(&store, "p10", None);
        assert_eq!(store.get(SELECTED_PROPERTY_KEY).unwrap(), None);
    }
}
