// src/connectivity.rs
use thiserror::Error;

use crate::remote::{PricingApi, RemoteError, Settings, SettingsUpdate};
use crate::store::{read_or_absent, write_or_log, KeyValueStore, PRICING_ENABLED_KEY};

/// Value used when neither the service nor the cache can say.
const FAIL_OPEN_DEFAULT: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    pub enabled: bool,
    /// `None` means local-only mode.
    pub property_id: Option<String>,
    /// A remote toggle is in flight. `enabled` still shows the value from
    /// before the toggle.
    pub pending: bool,
}

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("a pricing toggle is already in flight")]
    Busy,
    #[error("pricing toggle was not applied: {0}")]
    RemoteUnavailable(#[source] RemoteError),
    #[error("active property changed before the toggle completed")]
    Superseded,
    /// The active property is not known yet, so there is no flag to flip.
    #[error("active property has not been resolved")]
    Unresolved,
}

/// Outstanding settings read for one property.
#[derive(Debug)]
pub struct LoadTicket {
    property_id: String,
    epoch: u64,
}

/// Outstanding settings write. Consumed by `finish_toggle`.
#[derive(Debug)]
pub struct ToggleTicket {
    property_id: String,
    desired: bool,
    epoch: u64,
}

impl ToggleTicket {
    pub fn desired(&self) -> bool {
        self.desired
    }
}

#[derive(Debug)]
pub enum ToggleStart {
    /// Local-only mode: the flip is already applied and persisted.
    Committed(bool),
    /// The caller must send the update and hand the result to `finish_toggle`.
    Remote(ToggleTicket),
}

/// Owns the "pricing enabled" flag for the active property.
///
/// The service is authoritative when a property is set: toggles only flip
/// `enabled` after the update is confirmed. Without a property the flag
/// lives in the local cache alone.
#[derive(Debug)]
pub struct ConnectivityManager {
    state: ConnectivityState,
    loaded: bool,
    loading: bool,
    // Bumped on every property switch; stale tickets compare against it.
    epoch: u64,
}

impl ConnectivityManager {
    /// Starts in local-only mode from the cached flag.
    pub fn new<S: KeyValueStore>(store: &S) -> Self {
        Self {
            state: ConnectivityState {
                enabled: cached_or_default(store),
                property_id: None,
                pending: false,
            },
            loaded: false,
            loading: false,
            epoch: 0,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Points the manager at `property_id` and reconciles its flag.
    pub fn load<S, A>(&mut self, store: &S, api: &A, property_id: Option<&str>) -> ConnectivityState
    where
        S: KeyValueStore,
        A: PricingApi,
    {
        if let Some(ticket) = self.begin_load(store, property_id) {
            let result = api.settings(&ticket.property_id);
            self.finish_load(store, ticket, result);
        }
        self.state()
    }

    /// Switches to `property_id`.
    ///
    /// Returns a ticket when a remote read is needed. Returns `None` when the
    /// property is unchanged and already loaded or loading, or when there is
    /// no property (local-only mode resolves from the cache immediately).
    pub fn begin_load<S: KeyValueStore>(
        &mut self,
        store: &S,
        property_id: Option<&str>,
    ) -> Option<LoadTicket> {
        let same = self.state.property_id.as_deref() == property_id;
        if same && (self.loaded || self.loading) {
            tracing::debug!(?property_id, "connectivity already reconciled");
            return None;
        }

        if !same {
            self.epoch += 1;
            // A toggle for the previous property can no longer land here.
            self.state.pending = false;
        }
        self.state.property_id = property_id.map(str::to_string);
        self.state.enabled = cached_or_default(store);

        match property_id {
            None => {
                self.loaded = true;
                self.loading = false;
                None
            }
            Some(id) => {
                self.loaded = false;
                self.loading = true;
                Some(LoadTicket {
                    property_id: id.to_string(),
                    epoch: self.epoch,
                })
            }
        }
    }

    /// Applies a settings read. Returns false when the ticket went stale.
    pub fn finish_load<S: KeyValueStore>(
        &mut self,
        store: &S,
        ticket: LoadTicket,
        result: Result<Settings, RemoteError>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(property_id = %ticket.property_id, "dropping stale settings read");
            return false;
        }

        self.loading = false;
        self.loaded = true;

        match result {
            Ok(settings) => {
                let enabled = settings.pricing_status.is_enabled();
                self.state.enabled = enabled;
                write_or_log(store, PRICING_ENABLED_KEY, &enabled);
                tracing::debug!(
                    property_id = %ticket.property_id,
                    enabled,
                    "pricing status loaded"
                );
            }
            Err(e) => {
                // `enabled` already holds the cached value or the fail-open default.
                tracing::warn!(
                    property_id = %ticket.property_id,
                    error = %e,
                    enabled = self.state.enabled,
                    "settings read failed, using last known value"
                );
            }
        }
        true
    }

    /// Flips the flag, round-tripping through the service when a property is set.
    pub fn toggle<S, A>(&mut self, store: &S, api: &A) -> Result<bool, ConnectivityError>
    where
        S: KeyValueStore,
        A: PricingApi,
    {
        match self.begin_toggle(store)? {
            ToggleStart::Committed(enabled) => Ok(enabled),
            ToggleStart::Remote(ticket) => {
                let update = SettingsUpdate {
                    pricing_status: ticket.desired.into(),
                };
                let result = api.update_settings(&ticket.property_id, &update);
                self.finish_toggle(store, ticket, result)
            }
        }
    }

    pub fn begin_toggle<S: KeyValueStore>(
        &mut self,
        store: &S,
    ) -> Result<ToggleStart, ConnectivityError> {
        let Some(property_id) = self.state.property_id.clone() else {
            let enabled = !self.state.enabled;
            self.state.enabled = enabled;
            write_or_log(store, PRICING_ENABLED_KEY, &enabled);
            tracing::info!(enabled, "pricing toggled locally");
            return Ok(ToggleStart::Committed(enabled));
        };

        if self.state.pending {
            tracing::warn!(%property_id, "rejecting toggle while another is pending");
            return Err(ConnectivityError::Busy);
        }
        // Until the first read lands, `enabled` is only the cached guess and
        // flipping it could send the service its own value back.
        if self.loading {
            tracing::warn!(%property_id, "rejecting toggle while settings are loading");
            return Err(ConnectivityError::Busy);
        }

        self.state.pending = true;
        Ok(ToggleStart::Remote(ToggleTicket {
            property_id,
            desired: !self.state.enabled,
            epoch: self.epoch,
        }))
    }

    /// Commits or rolls back a remote toggle. Returns the committed value.
    pub fn finish_toggle<S: KeyValueStore>(
        &mut self,
        store: &S,
        ticket: ToggleTicket,
        result: Result<(), RemoteError>,
    ) -> Result<bool, ConnectivityError> {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                property_id = %ticket.property_id,
                "dropping toggle for previous property"
            );
            return Err(ConnectivityError::Superseded);
        }

        self.state.pending = false;

        match result {
            Ok(()) => {
                self.state.enabled = ticket.desired;
                write_or_log(store, PRICING_ENABLED_KEY, &ticket.desired);
                tracing::info!(
                    property_id = %ticket.property_id,
                    enabled = ticket.desired,
                    "pricing toggled"
                );
                Ok(ticket.desired)
            }
            Err(e) => {
                tracing::warn!(
                    property_id = %ticket.property_id,
                    error = %e,
                    "pricing toggle failed"
                );
                Err(ConnectivityError::RemoteUnavailable(e))
            }
        }
    }
}

fn cached_or_default<S: KeyValueStore>(store: &S) -> bool {
    read_or_absent(store, PRICING_ENABLED_KEY).unwrap_or(FAIL_OPEN_DEFAULT)
}
