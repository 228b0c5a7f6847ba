//! Person persistence
//!
//! Handlers and the orchestrator talk to storage only through `PersonStore`.
//! `SqlitePersonStore` is the production implementation.

use async_trait::async_trait;
use people_common::{EnrichedPerson, FullPerson, PersonUpdate, Result};

use crate::query::PersonFilter;

mod persons;
pub use persons::SqlitePersonStore;

/// One page of a filtered listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonPage {
    pub persons: Vec<FullPerson>,
    /// Records matching the filter across all pages
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Storage contract for person records
///
/// Errors: `Error::AlreadyExists` for a (name, surname, patronymic) collision,
/// `Error::NotFound` for an unknown id, `Error::Database` for everything else.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Insert a new person, returning the assigned id
    async fn create(&self, person: &EnrichedPerson) -> Result<i64>;

    async fn get_by_id(&self, id: i64) -> Result<FullPerson>;

    /// Filtered, id-ordered page plus the filtered total
    async fn list(&self, filter: &PersonFilter) -> Result<PersonPage>;

    /// Apply a non-empty patch and return the updated record
    async fn update(&self, id: i64, update: &PersonUpdate) -> Result<FullPerson>;

    async fn delete(&self, id: i64) -> Result<()>;
}
