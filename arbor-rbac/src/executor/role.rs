//! Role workflows

use super::Executor;
use crate::error::{RbacError, RbacResult};
use crate::models::{Action, Domain, ObjectType, ParentEntry, Role, User};
use crate::store::Presence;
use crate::tree::{annotate_parents, build_parent_map, detach_all, ensure_acyclic, reparent};
use crate::validation::ensure_id;

impl Executor {
    /// Roles in the current domain the current user can read, with parents
    /// taken from the live hierarchy
    pub async fn get_roles(&self) -> RbacResult<Vec<Role>> {
        let (user, domain) = self.current().await?;
        self.visible_roles(&user, &domain, Action::Read).await
    }

    pub async fn create_role(&self, mut role: Role) -> RbacResult<Role> {
        let (user, domain) = self.current().await?;
        role.domain_id = domain.id;

        if !self.store.roles().take(&role).await?.is_absent() {
            return Err(RbacError::AlreadyExists);
        }
        self.write_object_data_check(&role, &ObjectType::role()).await?;
        self.check_role_parent(&user, &domain, &role).await?;

        self.store.roles().create(&mut role).await?;
        reparent(&self.role_tree(), &role, &domain).await?;

        tracing::debug!("Created role {} in domain {}", role.id, domain.id);
        Ok(role)
    }

    pub async fn update_role(&self, mut role: Role) -> RbacResult<()> {
        ensure_id(&role)?;
        let (user, domain) = self.current().await?;
        let stored = self
            .active_role(role.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        role.domain_id = domain.id;

        self.write_object_data_check(&stored, &ObjectType::role()).await?;
        if role.object_id != stored.object_id {
            self.write_object_data_check(&role, &ObjectType::role()).await?;
        }
        if stored.is_root() {
            self.check_root(&user).await?;
        }
        if role.parent_id != stored.parent_id {
            self.check_role_parent(&user, &domain, &role).await?;
        }
        ensure_acyclic(&self.role_tree(), role.id, role.parent_id, &domain).await?;

        self.store.roles().update(&role).await?;
        reparent(&self.role_tree(), &role, &domain).await?;

        tracing::debug!("Updated role {} in domain {}", role.id, domain.id);
        Ok(())
    }

    /// Soft delete a role, detaching it from its parent and dropping its
    /// memberships. Its grants and child edges stay in place.
    pub async fn delete_role(&self, role: &Role) -> RbacResult<()> {
        ensure_id(role)?;
        let (user, domain) = self.current().await?;
        let stored = self
            .active_role(role.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;

        self.check(&stored, Action::Write).await?;
        if stored.is_root() {
            self.check_root(&user).await?;
        }

        detach_all(&self.role_tree(), &stored, &domain).await?;
        for member in self.engine.get_users_for_role_in_domain(&stored, &domain).await? {
            self.engine
                .remove_role_for_user_in_domain(&member, &stored, &domain)
                .await?;
        }
        self.store.roles().delete_by_id(stored.id).await?;

        tracing::debug!("Deleted role {} in domain {}", stored.id, domain.id);
        Ok(())
    }

    /// Bring back a soft-deleted role under its stored parent, which must be
    /// live and writable
    pub async fn recover_role(&self, mut role: Role) -> RbacResult<Role> {
        let (user, domain) = self.current().await?;
        role.domain_id = domain.id;

        let stored = match self.store.roles().take(&role).await? {
            Presence::Deleted(stored) if stored.domain_id == domain.id => stored,
            Presence::Active(_) => return Err(RbacError::AlreadyExists),
            _ => return Err(RbacError::NotExists),
        };

        self.check(&stored, Action::Write).await?;
        self.check_role_parent(&user, &domain, &stored).await?;

        let mut recovered = stored;
        self.store.roles().recover(&mut recovered).await?;
        reparent(&self.role_tree(), &recovered, &domain).await?;

        tracing::debug!("Recovered role {} in domain {}", recovered.id, domain.id);
        Ok(recovered)
    }

    /// A root role needs a superadmin; any other parent must be a live role
    /// the user can write
    async fn check_role_parent(&self, user: &User, domain: &Domain, role: &Role) -> RbacResult<()> {
        if role.is_root() {
            return self.check_root(user).await;
        }

        let parent = self
            .active_role(role.parent_id, domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        self.checker().require(user, domain, &parent, Action::Write).await
    }

    /// Store roles of the domain passing `action`, with live parents
    pub(super) async fn visible_roles(
        &self,
        user: &User,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<Vec<Role>> {
        let parents = build_parent_map(&self.engine.get_roles_in_domain(domain).await?);
        let roles = self.store.get_roles_in_domain(domain).await?;
        let mut roles = self.filter(user, domain, action, roles).await?;
        annotate_parents(&mut roles, &parents);
        Ok(roles)
    }
}
