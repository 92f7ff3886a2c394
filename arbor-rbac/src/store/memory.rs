//! In-memory metadata store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

use super::{EntityStore, MetadataStore, Presence};
use crate::error::{RbacError, RbacResult};
use crate::models::{Domain, Entry, InDomain, Object, Role, User};

#[derive(Debug, Clone)]
struct Row<T> {
    entry: T,
    deleted_at: Option<DateTime<Utc>>,
}

impl<T: Clone> Row<T> {
    fn presence(&self) -> Presence<T> {
        match self.deleted_at {
            None => Presence::Active(self.entry.clone()),
            Some(_) => Presence::Deleted(self.entry.clone()),
        }
    }
}

#[derive(Debug)]
struct TableState<T> {
    rows: BTreeMap<u64, Row<T>>,
    next_id: u64,
}

impl<T: Entry> TableState<T> {
    fn find(&self, entry: &T) -> Option<&Row<T>> {
        if entry.id() != 0 {
            return self.rows.get(&entry.id());
        }
        self.find_by_key(&entry.natural_key(), None)
    }

    fn find_by_key(&self, key: &str, except: Option<u64>) -> Option<&Row<T>> {
        self.rows
            .iter()
            .find(|(id, row)| Some(**id) != except && row.entry.natural_key() == key)
            .map(|(_, row)| row)
    }

    fn insert(&mut self, entry: &mut T) {
        if entry.id() == 0 {
            self.next_id += 1;
            entry.set_id(self.next_id);
        } else {
            self.next_id = self.next_id.max(entry.id());
        }
        self.rows.insert(
            entry.id(),
            Row {
                entry: entry.clone(),
                deleted_at: None,
            },
        );
    }
}

fn missing_row(id: u64) -> RbacError {
    RbacError::store(format!("row {} vanished while locked", id))
}

/// One entry kind's rows, with soft-delete timestamps and natural-key
/// uniqueness across active and deleted rows
#[derive(Debug)]
pub struct MemoryTable<T> {
    state: RwLock<TableState<T>>,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(TableState {
                rows: BTreeMap::new(),
                next_id: 0,
            }),
        }
    }
}

impl<T: Entry> MemoryTable<T> {
    /// Active entries matching `predicate`, ordered by id
    pub fn active_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.state
            .read()
            .rows
            .values()
            .filter(|row| row.deleted_at.is_none() && predicate(&row.entry))
            .map(|row| row.entry.clone())
            .collect()
    }

    /// When the entry with `id` was soft deleted
    pub fn deleted_at(&self, id: u64) -> Option<DateTime<Utc>> {
        self.state.read().rows.get(&id).and_then(|row| row.deleted_at)
    }
}

#[async_trait]
impl<T: Entry> EntityStore<T> for MemoryTable<T> {
    async fn create(&self, entry: &mut T) -> RbacResult<()> {
        let mut state = self.state.write();
        if state.find_by_key(&entry.natural_key(), None).is_some() {
            return Err(RbacError::AlreadyExists);
        }
        if entry.id() != 0 && state.rows.contains_key(&entry.id()) {
            return Err(RbacError::AlreadyExists);
        }
        state.insert(entry);
        Ok(())
    }

    async fn take(&self, entry: &T) -> RbacResult<Presence<T>> {
        let state = self.state.read();
        Ok(state.find(entry).map_or(Presence::Absent, Row::presence))
    }

    async fn update(&self, entry: &T) -> RbacResult<()> {
        let mut state = self.state.write();
        if state
            .find_by_key(&entry.natural_key(), Some(entry.id()))
            .is_some()
        {
            return Err(RbacError::AlreadyExists);
        }
        match state.rows.get_mut(&entry.id()) {
            Some(row) if row.deleted_at.is_none() => {
                row.entry = entry.clone();
                Ok(())
            }
            _ => Err(RbacError::NotExists),
        }
    }

    async fn delete_by_id(&self, id: u64) -> RbacResult<()> {
        let mut state = self.state.write();
        match state.rows.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(RbacError::NotExists),
        }
    }

    async fn recover(&self, entry: &mut T) -> RbacResult<()> {
        let mut state = self.state.write();
        let id = match state.find(entry) {
            Some(row) if row.deleted_at.is_some() => row.entry.id(),
            Some(_) => return Err(RbacError::AlreadyExists),
            None => return Err(RbacError::NotExists),
        };
        let row = state.rows.get_mut(&id).ok_or_else(|| missing_row(id))?;
        row.deleted_at = None;
        *entry = row.entry.clone();
        Ok(())
    }

    async fn upsert(&self, entry: &mut T) -> RbacResult<()> {
        let mut state = self.state.write();
        let existing = state
            .rows
            .get(&entry.id())
            .or_else(|| state.find_by_key(&entry.natural_key(), None))
            .map(|row| row.entry.id());

        match existing {
            Some(id) => {
                entry.set_id(id);
                let row = state.rows.get_mut(&id).ok_or_else(|| missing_row(id))?;
                row.entry = entry.clone();
                row.deleted_at = None;
            }
            None => state.insert(entry),
        }
        Ok(())
    }

    async fn get_by_ids(&self, ids: &[u64]) -> RbacResult<Vec<T>> {
        let state = self.state.read();
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| state.rows.get(id))
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.entry.clone())
            .collect())
    }
}

/// Metadata store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: MemoryTable<User>,
    roles: MemoryTable<Role>,
    objects: MemoryTable<Object>,
    domains: MemoryTable<Domain>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    fn users(&self) -> &dyn EntityStore<User> {
        &self.users
    }

    fn roles(&self) -> &dyn EntityStore<Role> {
        &self.roles
    }

    fn objects(&self) -> &dyn EntityStore<Object> {
        &self.objects
    }

    fn domains(&self) -> &dyn EntityStore<Domain> {
        &self.domains
    }

    async fn get_roles_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Role>> {
        Ok(self.roles.active_where(|role| role.domain_id() == domain.id))
    }

    async fn get_objects_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Object>> {
        Ok(self.objects.active_where(|object| object.domain_id() == domain.id))
    }

    async fn get_all_domains(&self) -> RbacResult<Vec<Domain>> {
        Ok(self.domains.active_where(|_| true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ObjectType, ROOT_ID};

    fn domain(name: &str) -> Domain {
        Domain::new(name)
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_rejects_duplicates() {
        let table = MemoryTable::<Domain>::default();
        let mut a = domain("domain_01");
        let mut b = domain("domain_02");
        table.create(&mut a).await.unwrap();
        table.create(&mut b).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let mut again = domain("domain_01");
        assert!(matches!(table.create(&mut again).await, Err(RbacError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_take_distinguishes_deleted() {
        let table = MemoryTable::<Domain>::default();
        let mut d = domain("domain_01");
        table.create(&mut d).await.unwrap();

        assert!(table.take(&domain("domain_01")).await.unwrap().is_active());
        table.delete_by_id(d.id).await.unwrap();
        assert!(table.deleted_at(d.id).is_some());

        let by_key = table.take(&domain("domain_01")).await.unwrap();
        assert!(by_key.is_deleted());
        assert!(table.take(&domain("other")).await.unwrap().is_absent());

        // soft-deleted rows still own their natural key
        let mut again = domain("domain_01");
        assert!(matches!(table.create(&mut again).await, Err(RbacError::AlreadyExists)));
        assert!(matches!(table.delete_by_id(d.id).await, Err(RbacError::NotExists)));
    }

    #[tokio::test]
    async fn test_recover_restores_identity() {
        let table = MemoryTable::<Domain>::default();
        let mut d = domain("domain_01");
        table.create(&mut d).await.unwrap();

        let mut active = d.clone();
        assert!(matches!(table.recover(&mut active).await, Err(RbacError::AlreadyExists)));

        table.delete_by_id(d.id).await.unwrap();
        let mut by_key = domain("domain_01");
        table.recover(&mut by_key).await.unwrap();
        assert_eq!(by_key.id, d.id);
        assert!(table.take(&d).await.unwrap().is_active());

        let mut missing = Domain { id: 42, ..Domain::default() };
        assert!(matches!(table.recover(&mut missing).await, Err(RbacError::NotExists)));
    }

    #[tokio::test]
    async fn test_update_requires_active_row_and_free_key() {
        let table = MemoryTable::<Domain>::default();
        let mut a = domain("a");
        let mut b = domain("b");
        table.create(&mut a).await.unwrap();
        table.create(&mut b).await.unwrap();

        let mut renamed = a.clone();
        renamed.name = "b".into();
        assert!(matches!(table.update(&renamed).await, Err(RbacError::AlreadyExists)));

        renamed.name = "c".into();
        table.update(&renamed).await.unwrap();
        assert_eq!(table.take(&a).await.unwrap().active().unwrap().name, "c");

        table.delete_by_id(b.id).await.unwrap();
        b.name = "d".into();
        assert!(matches!(table.update(&b).await, Err(RbacError::NotExists)));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let table = MemoryTable::<Object>::default();
        let mut o = Object::new("object_root", ObjectType::object(), ROOT_ID);
        o.domain_id = 1;
        table.upsert(&mut o).await.unwrap();
        let first = o.id;

        let mut again = Object::new("object_root", ObjectType::object(), ROOT_ID);
        again.domain_id = 1;
        table.upsert(&mut again).await.unwrap();
        assert_eq!(again.id, first);

        again.parent_id = 7;
        table.upsert(&mut again).await.unwrap();
        assert_eq!(table.take(&again).await.unwrap().active().unwrap().parent_id, 7);
        assert_eq!(table.active_where(|_| true).len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_revives_deleted_row() {
        let table = MemoryTable::<Object>::default();
        let mut o = Object::new("role_member", ObjectType::role(), ROOT_ID);
        o.domain_id = 1;
        table.upsert(&mut o).await.unwrap();
        table.delete_by_id(o.id).await.unwrap();

        let mut seeded = Object::new("role_member", ObjectType::role(), ROOT_ID);
        seeded.domain_id = 1;
        table.upsert(&mut seeded).await.unwrap();
        assert_eq!(seeded.id, o.id);
        assert!(table.deleted_at(o.id).is_none());
        assert!(table.take(&seeded).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_get_by_ids_skips_deleted_and_missing() {
        let table = MemoryTable::<User>::default();
        for email in ["a@x", "b@x", "c@x"] {
            table.create(&mut User::new("u", email)).await.unwrap();
        }
        table.delete_by_id(2).await.unwrap();

        let users = table.get_by_ids(&[3, 2, 9, 1, 3]).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_domain_listings() {
        let store = MemoryStore::new();
        let mut d1 = domain("d1");
        let mut d2 = domain("d2");
        store.domains().create(&mut d1).await.unwrap();
        store.domains().create(&mut d2).await.unwrap();

        let mut role = Role::new("admin", 0, ROOT_ID);
        role.domain_id = d1.id;
        store.roles().create(&mut role).await.unwrap();
        let mut other = Role::new("admin", 0, ROOT_ID);
        other.domain_id = d2.id;
        store.roles().create(&mut other).await.unwrap();

        assert_eq!(store.get_roles_in_domain(&d1).await.unwrap(), vec![role]);
        assert!(store.get_objects_in_domain(&d1).await.unwrap().is_empty());

        store.domains().delete_by_id(d2.id).await.unwrap();
        assert_eq!(store.get_all_domains().await.unwrap(), vec![d1]);
    }
}
