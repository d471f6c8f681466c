// src/errors.rs
use thiserror::Error;

use crate::connectivity::ConnectivityError;
use crate::remote::RemoteError;
use crate::store::StoreError;

/// Failures that reach the binary. The session core itself degrades to
/// state instead of returning these.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    #[error("no active property")]
    NoProperty,
    #[error("date cannot be resolved: {0}")]
    Unresolvable(String),
}
