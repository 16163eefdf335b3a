use cinelog_api::ApiError;
use serde::Serialize;
use thiserror::Error;
use crate::entity_store::EntityKind;
use crate::mutation::{MutationKey, Operation};

/// Lookup failures inside the entity store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} is not in the store")]
    NotFound { kind: EntityKind, id: String },
}

/// Why a dispatched intent did not commit
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("A request for {0} is already in flight")]
    Busy(MutationKey),
    #[error("{0}")]
    Invalid(String),
    /// The session ended or the store was reset while the request was in flight
    #[error("Result of {0} discarded after the session ended")]
    Superseded(Operation),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl DispatchError {
    pub fn is_busy(&self) -> bool {
        matches!(self, DispatchError::Busy(_))
    }
}

/// How a failure should be presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSurface {
    /// Missing entity, render an empty or placeholder view
    Placeholder,
    /// Session invalid, ask the user to log in again
    LoginPrompt,
    /// Rejected input, show next to the originating form
    Inline,
    /// Transient failure, show a dismissable banner
    Banner,
}

/// The most recent user-facing failure, as exposed in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfacedError {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<MutationKey>,
    pub surface: ErrorSurface,
    pub message: String,
}

impl SurfacedError {
    pub fn new(operation: Operation, key: Option<MutationKey>, error: &DispatchError) -> Self {
        let surface = match error {
            DispatchError::Api(ApiError::NotFound) => ErrorSurface::Placeholder,
            DispatchError::Api(ApiError::Unauthorized) => ErrorSurface::LoginPrompt,
            DispatchError::Api(ApiError::Validation(_)) | DispatchError::Invalid(_) => ErrorSurface::Inline,
            DispatchError::Api(ApiError::Network(_))
            | DispatchError::Busy(_)
            | DispatchError::Superseded(_) => ErrorSurface::Banner,
        };
        let message = match error {
            DispatchError::Api(ApiError::NotFound) => format!("{} found nothing", operation),
            other => other.to_string(),
        };
        Self { operation, key, surface, message }
    }
}
