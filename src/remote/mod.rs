mod client;
mod models;
mod remote_error;

pub use client::HttpPricingApi;
pub use models::{
    CompetitorPrice, MspFact, PriceHistory, PricingStatus, Property, PropertySnapshot, Settings,
    SettingsUpdate,
};
pub use remote_error::RemoteError;

use crate::calendar::IsoKey;

/// The pricing backend as seen by the session core.
///
/// Every call blocks the caller until the service answers or fails. Callers
/// in this crate convert failures into state instead of propagating them.
pub trait PricingApi {
    fn settings(&self, property_id: &str) -> Result<Settings, RemoteError>;

    fn update_settings(&self, property_id: &str, update: &SettingsUpdate)
        -> Result<(), RemoteError>;

    /// Properties owned by `user_id`, newest first.
    fn properties(&self, user_id: &str) -> Result<Vec<Property>, RemoteError>;

    fn msp(&self, property_id: &str, date: &IsoKey) -> Result<MspFact, RemoteError>;

    fn price_history(&self, property_id: &str, date: &IsoKey)
        -> Result<PriceHistory, RemoteError>;
}
