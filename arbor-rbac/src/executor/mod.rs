//! Per-request workflow orchestration
//!
//! Every mutation runs validation, then existence checks against the store,
//! then permission checks, then hierarchy or diff computation, then the
//! engine and store calls. The first error aborts the workflow; calls that
//! already went through are not rolled back.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::CurrentProvider;
use crate::engine::EnforcementEngine;
use crate::error::{RbacError, RbacResult};
use crate::models::{
    Action, Domain, Entry, EntryFactory, Object, ObjectData, ObjectType, Role, User,
};
use crate::permissions::PermissionChecker;
use crate::seed::DomainCreator;
use crate::store::MetadataStore;
use crate::tree::{ObjectTree, RoleTree};

mod domain;
mod object;
mod object_data;
mod policy;
mod role;
mod superadmin;
mod user;

/// Workflows bound to one current-context provider
pub struct Executor {
    engine: Arc<dyn EnforcementEngine>,
    store: Arc<dyn MetadataStore>,
    factory: Arc<dyn EntryFactory>,
    domain_creator: Arc<dyn DomainCreator>,
    provider: Arc<dyn CurrentProvider>,
    superadmin_enabled: bool,
}

impl Executor {
    pub(crate) fn new(
        engine: Arc<dyn EnforcementEngine>,
        store: Arc<dyn MetadataStore>,
        factory: Arc<dyn EntryFactory>,
        domain_creator: Arc<dyn DomainCreator>,
        provider: Arc<dyn CurrentProvider>,
        superadmin_enabled: bool,
    ) -> Self {
        Self {
            engine,
            store,
            factory,
            domain_creator,
            provider,
            superadmin_enabled,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CurrentProvider> {
        &self.provider
    }

    fn checker(&self) -> PermissionChecker<'_> {
        PermissionChecker::new(&*self.engine, &*self.factory, self.superadmin_enabled)
    }

    fn role_tree(&self) -> RoleTree<'_> {
        RoleTree::new(&*self.engine, &*self.factory)
    }

    fn object_tree(&self) -> ObjectTree<'_> {
        ObjectTree::new(&*self.engine, &*self.factory)
    }

    async fn current(&self) -> RbacResult<(User, Domain)> {
        self.provider.get().await
    }

    /// Require `action` on the object governing `item` for the current user
    async fn check<D: ObjectData + ?Sized>(&self, item: &D, action: Action) -> RbacResult<()> {
        let (user, domain) = self.current().await?;
        self.checker().require(&user, &domain, item, action).await
    }

    async fn filter<D: ObjectData>(
        &self,
        user: &User,
        domain: &Domain,
        action: Action,
        items: Vec<D>,
    ) -> RbacResult<Vec<D>> {
        self.checker().filter(user, domain, action, items).await
    }

    /// Root entries are only changed by superadmins while the toggle is on
    async fn check_root(&self, user: &User) -> RbacResult<()> {
        if !self.superadmin_enabled {
            return Ok(());
        }
        if self.checker().is_superadmin(user).await? {
            return Ok(());
        }
        tracing::warn!("User {} denied root entry change", user.id);
        Err(RbacError::CannotOperateRootWithoutSuperadmin)
    }

    /// Write on the object governing `item`, which must exist in the current
    /// domain with type `ty`
    async fn write_object_data_check<D: ObjectData + ?Sized>(
        &self,
        item: &D,
        ty: &ObjectType,
    ) -> RbacResult<()> {
        let (user, domain) = self.current().await?;
        self.checker().require(&user, &domain, item, Action::Write).await?;

        let object = self
            .active_object(item.object_id(), &domain)
            .await?
            .ok_or(RbacError::InvalidObject)?;
        if object.object_type() != ty {
            return Err(RbacError::InvalidObjectType);
        }
        Ok(())
    }

    async fn active_role(&self, id: u64, domain: &Domain) -> RbacResult<Option<Role>> {
        if id == 0 {
            return Ok(None);
        }
        let mut template = self.factory.new_role();
        template.set_id(id);
        Ok(self
            .store
            .roles()
            .take(&template)
            .await?
            .active()
            .filter(|role| role.domain_id == domain.id))
    }

    async fn active_object(&self, id: u64, domain: &Domain) -> RbacResult<Option<Object>> {
        if id == 0 {
            return Ok(None);
        }
        let mut template = self.factory.new_object();
        template.set_id(id);
        Ok(self
            .store
            .objects()
            .take(&template)
            .await?
            .active()
            .filter(|object| object.domain_id == domain.id))
    }

    async fn active_user(&self, id: u64) -> RbacResult<Option<User>> {
        if id == 0 {
            return Ok(None);
        }
        let mut template = self.factory.new_user();
        template.set_id(id);
        Ok(self.store.users().take(&template).await?.active())
    }

    /// Active store roles the user holds in the domain
    async fn held_roles(&self, user: &User, domain: &Domain) -> RbacResult<Vec<Role>> {
        let ids = ids(&self.engine.get_roles_for_user_in_domain(user, domain).await?);
        self.store.roles().get_by_ids(&ids).await
    }
}

fn ids<E: Entry>(entries: &[E]) -> Vec<u64> {
    entries.iter().map(Entry::id).collect()
}

fn by_id<E: Entry>(entries: Vec<E>) -> HashMap<u64, E> {
    entries.into_iter().map(|e| (e.id(), e)).collect()
}

/// Ids of both lists, first appearance order, without repeats
fn union_ids(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut seen = std::collections::HashSet::new();
    a.iter().chain(b).copied().filter(|id| seen.insert(*id)).collect()
}
