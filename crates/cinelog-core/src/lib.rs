pub mod aggregate;
pub mod coordinator;
pub mod entity_store;
pub mod error;
pub mod mutation;
pub mod pagination;
pub mod snapshot;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use aggregate::{AggregateTracker, StatsSource, StatsUpdate};
pub use coordinator::{DispatchResult, ToggleOutcome};
pub use entity_store::{Collection, Entity, EntityKind, EntityStore};
pub use error::{DispatchError, ErrorSurface, StoreError, SurfacedError};
pub use mutation::{MutationKey, Operation, OptimisticOverlay, PendingSet};
pub use pagination::{Cursors, PaginationCursor};
pub use snapshot::{ReviewOwner, Session, SessionStatus, Snapshot};
pub use store::{CatalogStore, StoreOptions, Subscription};
