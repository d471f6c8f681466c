use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::calendar::IsoKey;
use crate::remote::{
    CompetitorPrice, MspFact, PriceHistory, PricingApi, PricingStatus, Property, RemoteError,
    Settings, SettingsUpdate,
};
use crate::store::SqliteStore;

/// Fresh SQLite store with the production schema applied.
pub fn init_test_store() -> SqliteStore {
    SqliteStore::open_in_memory()
        .unwrap_or_else(|e| panic!("store initialization failed: {e}"))
}

pub fn property(id: &str, name: &str) -> Property {
    Property {
        id: id.to_string(),
        name: name.to_string(),
        created_at: None,
    }
}

pub fn msp(date: &str, price: f64) -> MspFact {
    MspFact {
        date: date.to_string(),
        msp: price,
        currency: Some("EUR".to_string()),
    }
}

fn unavailable() -> RemoteError {
    RemoteError::Unavailable("connection refused".to_string())
}

/// In-process pricing service with call counters and switchable failures.
///
/// Updates are applied to the stored status, so a later `settings` read
/// sees them.
#[derive(Default)]
pub struct FakePricingApi {
    statuses: RefCell<HashMap<String, PricingStatus>>,
    properties: HashMap<String, Vec<Property>>,
    msps: HashMap<(String, String), MspFact>,
    histories: HashMap<(String, String), PriceHistory>,
    fail_settings: bool,
    fail_updates: bool,
    fail_properties: bool,
    fail_facts: bool,
    settings_calls: Cell<usize>,
    update_calls: Cell<usize>,
    properties_calls: Cell<usize>,
    msp_calls: Cell<usize>,
}

impl FakePricingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, property_id: &str, status: PricingStatus) -> Self {
        self.statuses
            .borrow_mut()
            .insert(property_id.to_string(), status);
        self
    }

    pub fn with_properties(mut self, user_id: &str, list: Vec<Property>) -> Self {
        self.properties.insert(user_id.to_string(), list);
        self
    }

    pub fn with_msp(mut self, property_id: &str, date: &str, price: f64) -> Self {
        self.msps.insert(
            (property_id.to_string(), date.to_string()),
            msp(date, price),
        );
        self
    }

    pub fn with_history(mut self, property_id: &str, date: &str, prices: &[(&str, f64)]) -> Self {
        let history = PriceHistory {
            date: date.to_string(),
            prices: prices
                .iter()
                .map(|(competitor, price)| CompetitorPrice {
                    competitor: competitor.to_string(),
                    price: *price,
                    observed_at: None,
                })
                .collect(),
        };
        self.histories
            .insert((property_id.to_string(), date.to_string()), history);
        self
    }

    pub fn failing_settings(mut self) -> Self {
        self.fail_settings = true;
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn failing_properties(mut self) -> Self {
        self.fail_properties = true;
        self
    }

    pub fn failing_facts(mut self) -> Self {
        self.fail_facts = true;
        self
    }

    pub fn status_of(&self, property_id: &str) -> Option<PricingStatus> {
        self.statuses.borrow().get(property_id).copied()
    }

    pub fn settings_calls(&self) -> usize {
        self.settings_calls.get()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.get()
    }

    pub fn properties_calls(&self) -> usize {
        self.properties_calls.get()
    }

    pub fn msp_calls(&self) -> usize {
        self.msp_calls.get()
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl PricingApi for FakePricingApi {
    fn settings(&self, property_id: &str) -> Result<Settings, RemoteError> {
        bump(&self.settings_calls);
        if self.fail_settings {
            return Err(unavailable());
        }
        self.status_of(property_id)
            .map(|pricing_status| Settings { pricing_status })
            .ok_or_else(|| RemoteError::NotFound(format!("settings for {property_id}")))
    }

    fn update_settings(
        &self,
        property_id: &str,
        update: &SettingsUpdate,
    ) -> Result<(), RemoteError> {
        bump(&self.update_calls);
        if self.fail_updates {
            return Err(unavailable());
        }
        self.statuses
            .borrow_mut()
            .insert(property_id.to_string(), update.pricing_status);
        Ok(())
    }

    fn properties(&self, user_id: &str) -> Result<Vec<Property>, RemoteError> {
        bump(&self.properties_calls);
        if self.fail_properties {
            return Err(unavailable());
        }
        Ok(self.properties.get(user_id).cloned().unwrap_or_default())
    }

    fn msp(&self, property_id: &str, date: &IsoKey) -> Result<MspFact, RemoteError> {
        bump(&self.msp_calls);
        if self.fail_facts {
            return Err(unavailable());
        }
        self.msps
            .get(&(property_id.to_string(), date.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("msp for {date}")))
    }

    fn price_history(
        &self,
        property_id: &str,
        date: &IsoKey,
    ) -> Result<PriceHistory, RemoteError> {
        if self.fail_facts {
            return Err(unavailable());
        }
        self.histories
            .get(&(property_id.to_string(), date.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("price history for {date}")))
    }
}
