//! Role and object hierarchies
//!
//! The engine holds the live parent edges. Everything here walks them one
//! level at a time.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::engine::EnforcementEngine;
use crate::error::{RbacError, RbacResult};
use crate::models::{Domain, EntryFactory, Object, ParentEntry, Role, ROOT_ID};

/// Map every entry id to its parent id
pub fn build_parent_map<E: ParentEntry>(entries: &[E]) -> HashMap<u64, u64> {
    entries
        .iter()
        .map(|entry| (entry.id(), entry.parent_id()))
        .collect()
}

/// Overwrite each entry's parent with the one in `parents`, when present
pub fn annotate_parents<E: ParentEntry>(entries: &mut [E], parents: &HashMap<u64, u64>) {
    for entry in entries.iter_mut() {
        if let Some(parent_id) = parents.get(&entry.id()) {
            entry.set_parent_id(*parent_id);
        }
    }
}

/// One-level hierarchy operations over the engine
#[async_trait]
pub trait HierarchyOps<E: ParentEntry>: Send + Sync {
    /// Empty entry with only the id set
    fn template(&self, id: u64) -> E;

    async fn parents(&self, node: &E, domain: &Domain) -> RbacResult<Vec<E>>;

    async fn children(&self, node: &E, domain: &Domain) -> RbacResult<Vec<E>>;

    async fn attach(&self, node: &E, parent: &E, domain: &Domain) -> RbacResult<()>;

    async fn detach(&self, node: &E, parent: &E, domain: &Domain) -> RbacResult<()>;
}

/// Role tree view of an engine
pub struct RoleTree<'a> {
    engine: &'a dyn EnforcementEngine,
    factory: &'a dyn EntryFactory,
}

impl<'a> RoleTree<'a> {
    pub fn new(engine: &'a dyn EnforcementEngine, factory: &'a dyn EntryFactory) -> Self {
        Self { engine, factory }
    }
}

#[async_trait]
impl HierarchyOps<Role> for RoleTree<'_> {
    fn template(&self, id: u64) -> Role {
        let mut role = self.factory.new_role();
        role.id = id;
        role
    }

    async fn parents(&self, node: &Role, domain: &Domain) -> RbacResult<Vec<Role>> {
        self.engine.get_parents_for_role_in_domain(node, domain).await
    }

    async fn children(&self, node: &Role, domain: &Domain) -> RbacResult<Vec<Role>> {
        self.engine.get_children_for_role_in_domain(node, domain).await
    }

    async fn attach(&self, node: &Role, parent: &Role, domain: &Domain) -> RbacResult<()> {
        self.engine.add_parent_for_role_in_domain(node, parent, domain).await
    }

    async fn detach(&self, node: &Role, parent: &Role, domain: &Domain) -> RbacResult<()> {
        self.engine.remove_parent_for_role_in_domain(node, parent, domain).await
    }
}

/// Object tree view of an engine
pub struct ObjectTree<'a> {
    engine: &'a dyn EnforcementEngine,
    factory: &'a dyn EntryFactory,
}

impl<'a> ObjectTree<'a> {
    pub fn new(engine: &'a dyn EnforcementEngine, factory: &'a dyn EntryFactory) -> Self {
        Self { engine, factory }
    }
}

#[async_trait]
impl HierarchyOps<Object> for ObjectTree<'_> {
    fn template(&self, id: u64) -> Object {
        let mut object = self.factory.new_object();
        object.id = id;
        object
    }

    async fn parents(&self, node: &Object, domain: &Domain) -> RbacResult<Vec<Object>> {
        self.engine.get_parents_for_object_in_domain(node, domain).await
    }

    async fn children(&self, node: &Object, domain: &Domain) -> RbacResult<Vec<Object>> {
        self.engine.get_children_for_object_in_domain(node, domain).await
    }

    async fn attach(&self, node: &Object, parent: &Object, domain: &Domain) -> RbacResult<()> {
        self.engine.add_parent_for_object_in_domain(node, parent, domain).await
    }

    async fn detach(&self, node: &Object, parent: &Object, domain: &Domain) -> RbacResult<()> {
        self.engine.remove_parent_for_object_in_domain(node, parent, domain).await
    }
}

/// Fail with `CircularHierarchy` if `parent_id` is `node_id` or one of its
/// descendants.
pub async fn ensure_acyclic<E, T>(
    tree: &T,
    node_id: u64,
    parent_id: u64,
    domain: &Domain,
) -> RbacResult<()>
where
    E: ParentEntry,
    T: HierarchyOps<E> + ?Sized,
{
    if parent_id == ROOT_ID {
        return Ok(());
    }

    let mut visited = HashSet::new();
    let mut frontier = vec![tree.template(parent_id)];
    while let Some(current) = frontier.pop() {
        if current.id() == node_id {
            return Err(RbacError::CircularHierarchy);
        }
        if !visited.insert(current.id()) {
            continue;
        }
        frontier.extend(tree.parents(&current, domain).await?);
    }

    Ok(())
}

/// Move `node` under `node.parent_id()`, or detach it fully when that is the
/// root sentinel. Edges already in place are left alone.
pub async fn reparent<E, T>(tree: &T, node: &E, domain: &Domain) -> RbacResult<()>
where
    E: ParentEntry,
    T: HierarchyOps<E> + ?Sized,
{
    let desired = node.parent_id();
    ensure_acyclic::<E, T>(tree, node.id(), desired, domain).await?;

    let current = tree.parents(node, domain).await?;
    let mut attached = false;
    for parent in &current {
        if parent.id() == desired {
            attached = true;
        } else {
            tree.detach(node, parent, domain).await?;
        }
    }

    if desired != ROOT_ID && !attached {
        tree.attach(node, &tree.template(desired), domain).await?;
    }

    Ok(())
}

/// Remove every parent edge of `node`
pub async fn detach_all<E, T>(tree: &T, node: &E, domain: &Domain) -> RbacResult<()>
where
    E: ParentEntry,
    T: HierarchyOps<E> + ?Sized,
{
    for parent in tree.parents(node, domain).await? {
        tree.detach(node, &parent, domain).await?;
    }
    Ok(())
}
