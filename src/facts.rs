// src/facts.rs
use std::collections::HashMap;

use crate::calendar::IsoKey;
use crate::remote::{MspFact, PriceHistory, PricingApi, RemoteError};

/// Identity of a per-day request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactKey {
    pub property_id: String,
    pub date: IsoKey,
}

impl FactKey {
    pub fn new(property_id: impl Into<String>, date: IsoKey) -> Self {
        Self {
            property_id: property_id.into(),
            date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateFact {
    pub status: FactStatus,
    pub value: Option<MspFact>,
    pub history: Option<PriceHistory>,
    request: Option<u64>,
}

impl DateFact {
    /// Loaded, but the service holds no MSP for the day.
    pub fn is_not_configured(&self) -> bool {
        self.status == FactStatus::Loaded && self.value.is_none()
    }
}

/// What one fetch returns. `msp` is `None` when the service has no fact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactPayload {
    pub msp: Option<MspFact>,
    pub history: Option<PriceHistory>,
}

#[derive(Debug)]
pub struct FactTicket {
    key: FactKey,
    request: u64,
}

impl FactTicket {
    pub fn key(&self) -> &FactKey {
        &self.key
    }
}

/// Tracks per-day pricing facts for the dates the user visits.
///
/// A response is committed only if it belongs to the request currently
/// recorded for its key and that key is still the one being viewed.
#[derive(Debug, Default)]
pub struct FactLoader {
    facts: HashMap<FactKey, DateFact>,
    active: Option<FactKey>,
    next_request: u64,
}

impl FactLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact(&self, key: &FactKey) -> Option<&DateFact> {
        self.facts.get(key)
    }

    pub fn active(&self) -> Option<&FactKey> {
        self.active.as_ref()
    }

    pub fn active_fact(&self) -> Option<&DateFact> {
        self.active.as_ref().and_then(|k| self.facts.get(k))
    }

    /// Loads `key` through `api` and returns its record.
    pub fn load<A: PricingApi>(&mut self, api: &A, key: FactKey) -> DateFact {
        if let Some(ticket) = self.begin(key.clone()) {
            let result = fetch(api, &ticket.key);
            self.complete(ticket, result);
        }
        self.facts.get(&key).cloned().unwrap_or_default()
    }

    /// Makes `key` the active one and starts a fetch if it needs one.
    ///
    /// Returns `None` when the key is already loading or loaded; the caller
    /// must not fetch in that case.
    pub fn begin(&mut self, key: FactKey) -> Option<FactTicket> {
        let switched = self
            .active
            .as_ref()
            .is_some_and(|active| active.property_id != key.property_id);
        if switched {
            self.evict_other_properties(&key.property_id);
        }
        self.active = Some(key.clone());
        let entry = self.facts.entry(key.clone()).or_default();

        match entry.status {
            FactStatus::Loading | FactStatus::Loaded => {
                tracing::debug!(
                    property_id = %key.property_id,
                    iso_key = %key.date,
                    status = ?entry.status,
                    "fact request deduplicated"
                );
                None
            }
            FactStatus::Idle | FactStatus::Failed => {
                self.next_request += 1;
                entry.status = FactStatus::Loading;
                entry.request = Some(self.next_request);
                Some(FactTicket {
                    key,
                    request: self.next_request,
                })
            }
        }
    }

    /// Forgets settled facts of properties other than `property_id`.
    /// In-flight entries stay so their responses can still be matched.
    fn evict_other_properties(&mut self, property_id: &str) {
        let before = self.facts.len();
        self.facts.retain(|key, fact| {
            key.property_id == property_id || fact.status == FactStatus::Loading
        });
        tracing::debug!(property_id, evicted = before - self.facts.len(), "pruned facts");
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Applies a fetch result. Returns false when the result was discarded.
    pub fn complete(
        &mut self,
        ticket: FactTicket,
        result: Result<FactPayload, RemoteError>,
    ) -> bool {
        let is_active = self.active.as_ref() == Some(&ticket.key);
        let Some(entry) = self.facts.get_mut(&ticket.key) else {
            return false;
        };

        if entry.request != Some(ticket.request) {
            tracing::debug!(
                request = ticket.request,
                iso_key = %ticket.key.date,
                "dropping response for replaced request"
            );
            return false;
        }
        entry.request = None;

        if !is_active {
            // Superseded: forget the fetch so a later visit asks again.
            entry.status = FactStatus::Idle;
            tracing::debug!(
                property_id = %ticket.key.property_id,
                iso_key = %ticket.key.date,
                "dropping response for superseded date"
            );
            return false;
        }

        match result {
            Ok(payload) => {
                entry.status = FactStatus::Loaded;
                entry.value = payload.msp;
                entry.history = payload.history;
            }
            Err(e) => {
                tracing::warn!(
                    property_id = %ticket.key.property_id,
                    iso_key = %ticket.key.date,
                    error = %e,
                    "fact fetch failed"
                );
                entry.status = FactStatus::Failed;
                entry.value = None;
                entry.history = None;
            }
        }
        true
    }
}

/// Fetches the MSP and price history for one key.
///
/// A missing MSP is not an error. History is best effort and never fails the
/// fact on its own.
pub fn fetch<A: PricingApi>(api: &A, key: &FactKey) -> Result<FactPayload, RemoteError> {
    let msp = match api.msp(&key.property_id, &key.date) {
        Ok(fact) => Some(fact),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };

    let history = match api.price_history(&key.property_id, &key.date) {
        Ok(history) => Some(history),
        Err(e) => {
            if !e.is_not_found() {
                tracing::warn!(iso_key = %key.date, error = %e, "price history unavailable");
            }
            None
        }
    };

    Ok(FactPayload { msp, history })
}
