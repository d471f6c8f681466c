//! Client-side session core for the hotel pricing dashboard.
//!
//! Reconciles the active property and its "pricing enabled" flag across a
//! durable local cache and the pricing service, and loads per-day pricing
//! facts keyed by canonical ISO dates.

pub mod calendar;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod facts;
pub mod property;
pub mod remote;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use calendar::IsoKey;
pub use config::Config;
pub use connectivity::{ConnectivityError, ConnectivityManager, ConnectivityState};
pub use errors::AppError;
pub use facts::{DateFact, FactKey, FactLoader, FactStatus};
pub use property::{PropertyResolver, Resolution};
pub use remote::{HttpPricingApi, PricingApi, RemoteError};
pub use session::Session;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
