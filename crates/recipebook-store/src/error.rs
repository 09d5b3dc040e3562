use std::time::Duration;

use recipebook_shared::{DecodeError, ValidationError};
use thiserror::Error;

use crate::remote::RemoteError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Draft or edited recipe failed shape checks. No remote call was made.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The recipe lacks the identity required by the operation. No remote
    /// call was made.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The remote call failed or timed out. Local state is unchanged.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// A recipe could not be encoded for the remote store.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{operation} requires a remote id")]
    MissingRemoteId { operation: &'static str },
}

#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
