//! Metadata store contract
//!
//! The store persists entry attributes and soft-delete state. Relationships
//! live in the enforcement engine, not here.

use async_trait::async_trait;

use crate::error::RbacResult;
use crate::models::{Domain, Entry, Object, Role, User};

pub mod memory;

pub use memory::{MemoryStore, MemoryTable};

/// Lookup outcome distinguishing soft-deleted rows from missing ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    Absent,
    Active(T),
    Deleted(T),
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Presence::Active(_))
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Presence::Deleted(_))
    }

    /// The entry when it is active
    pub fn active(self) -> Option<T> {
        match self {
            Presence::Active(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Persistence for one entry kind
#[async_trait]
pub trait EntityStore<T: Entry>: Send + Sync {
    /// Insert a new entry and assign its id
    async fn create(&self, entry: &mut T) -> RbacResult<()>;

    /// Find by id when it is non-zero, else by natural key
    async fn take(&self, entry: &T) -> RbacResult<Presence<T>>;

    /// Replace the attributes of an active entry
    async fn update(&self, entry: &T) -> RbacResult<()>;

    /// Soft delete an active entry
    async fn delete_by_id(&self, id: u64) -> RbacResult<()>;

    /// Undo a soft delete; `entry` receives the stored attributes
    async fn recover(&self, entry: &mut T) -> RbacResult<()>;

    /// Create, or update and revive the row with the same id or natural key
    async fn upsert(&self, entry: &mut T) -> RbacResult<()>;

    /// Active entries among `ids`, in request order
    async fn get_by_ids(&self, ids: &[u64]) -> RbacResult<Vec<T>>;
}

/// Store for every entry kind plus domain-wide listings
#[async_trait]
pub trait MetadataStore: Send + Sync {
    fn users(&self) -> &dyn EntityStore<User>;

    fn roles(&self) -> &dyn EntityStore<Role>;

    fn objects(&self) -> &dyn EntityStore<Object>;

    fn domains(&self) -> &dyn EntityStore<Domain>;

    async fn get_roles_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Role>>;

    async fn get_objects_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Object>>;

    async fn get_all_domains(&self) -> RbacResult<Vec<Domain>>;
}
