// src/session.rs
use crate::calendar::{self, IsoKey, ENGLISH_MONTHS};
use crate::connectivity::{ConnectivityError, ConnectivityManager, ConnectivityState};
use crate::facts::{DateFact, FactKey, FactLoader};
use crate::property::{PropertyResolver, Resolution};
use crate::remote::{PricingApi, PropertySnapshot};
use crate::store::KeyValueStore;

/// The session context handed to every view.
///
/// Owns the store and the service handle, and keeps the active property,
/// the pricing flag and the per-day facts consistent with each other.
/// Whenever the active property changes, connectivity follows it.
pub struct Session<S, A> {
    store: S,
    api: A,
    user_id: String,
    month_names: Vec<String>,
    properties: PropertyResolver,
    connectivity: ConnectivityManager,
    facts: FactLoader,
}

impl<S, A> Session<S, A>
where
    S: KeyValueStore,
    A: PricingApi,
{
    /// Reads cached state; makes no remote calls.
    pub fn start(store: S, api: A, user_id: impl Into<String>) -> Self {
        let properties = PropertyResolver::new(&store);
        let connectivity = ConnectivityManager::new(&store);

        Self {
            store,
            api,
            user_id: user_id.into(),
            month_names: ENGLISH_MONTHS.iter().map(|m| m.to_string()).collect(),
            properties,
            connectivity,
            facts: FactLoader::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn property_id(&self) -> Option<&str> {
        self.properties.selected()
    }

    pub fn property_snapshot(&self) -> Option<&PropertySnapshot> {
        self.properties.snapshot()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity.state()
    }

    pub fn facts(&self) -> &FactLoader {
        &self.facts
    }

    /// Sets the month names of the active display language, January first.
    pub fn set_display_months<I, T>(&mut self, names: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.month_names = names.into_iter().map(Into::into).collect();
    }

    /// Determines the active property.
    ///
    /// A cached selection answers without a round trip; otherwise the owned
    /// property list is fetched and its newest entry promoted.
    pub fn resolve_property(&mut self) -> Resolution {
        let resolution = match self.properties.resolve() {
            selected @ Resolution::Selected(_) => selected,
            _ => self.properties.refresh(&self.store, &self.api, &self.user_id),
        };
        self.follow(&resolution);
        resolution
    }

    /// Fetches the property list again, e.g. after the user created one.
    pub fn refresh_properties(&mut self) -> Resolution {
        let resolution = self.properties.refresh(&self.store, &self.api, &self.user_id);
        self.follow(&resolution);
        resolution
    }

    /// User navigated to `property_id`.
    pub fn navigate(&mut self, property_id: &str, snapshot: Option<PropertySnapshot>) {
        self.properties.navigate(&self.store, property_id, snapshot);
        self.connectivity
            .load(&self.store, &self.api, Some(property_id));
    }

    /// Flips pricing for the active property.
    ///
    /// Local-only toggles are allowed only once the user is known to own no
    /// property; before that the shared cached flag must not be touched.
    pub fn toggle_pricing(&mut self) -> Result<bool, ConnectivityError> {
        if matches!(
            self.properties.resolve(),
            Resolution::Awaiting | Resolution::Unavailable
        ) {
            tracing::warn!("rejecting toggle before the property is resolved");
            return Err(ConnectivityError::Unresolved);
        }
        self.connectivity.toggle(&self.store, &self.api)
    }

    /// ISO key for a displayed date, or `None` when it cannot be resolved.
    pub fn resolve_date(&self, day: u32, month_name: &str, year: &str) -> Option<IsoKey> {
        calendar::resolve(day, month_name, year, self.month_names.as_slice())
    }

    /// Loads the facts for `date` on the active property.
    ///
    /// Returns `None` while no property is active.
    pub fn load_fact(&mut self, date: IsoKey) -> Option<DateFact> {
        let property_id = self.properties.selected()?.to_string();
        Some(self.facts.load(&self.api, FactKey::new(property_id, date)))
    }

    fn follow(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Selected(id) | Resolution::Redirect(id) => {
                self.connectivity.load(&self.store, &self.api, Some(id.as_str()));
            }
            Resolution::NoProperty => {
                self.connectivity.load(&self.store, &self.api, None);
            }
            Resolution::Awaiting | Resolution::Unavailable => {}
        }
    }
}
