//! User accounts and role memberships

use super::{by_id, ids, union_ids, Executor};
use crate::diff::diff;
use crate::error::{RbacError, RbacResult};
use crate::models::{Action, Domain, Role, RolesForUser, User, UserRolePair, UsersForRole};
use crate::store::Presence;
use crate::validation::ensure_id;

impl Executor {
    /// Register an account. Accounts are not domain scoped, so there is no
    /// permission check.
    pub async fn create_user(&self, mut user: User) -> RbacResult<User> {
        if !self.store.users().take(&user).await?.is_absent() {
            return Err(RbacError::AlreadyExists);
        }
        self.store.users().create(&mut user).await?;

        tracing::debug!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn recover_user(&self, mut user: User) -> RbacResult<User> {
        match self.store.users().take(&user).await? {
            Presence::Active(_) => return Err(RbacError::AlreadyExists),
            Presence::Absent => return Err(RbacError::NotExists),
            Presence::Deleted(_) => {}
        }
        self.store.users().recover(&mut user).await?;

        tracing::debug!("Recovered user {}", user.id);
        Ok(user)
    }

    pub async fn update_user(&self, user: &User) -> RbacResult<()> {
        let (actor, domain) = self.current().await?;
        let stored = self.existing_user(user).await?;
        self.require_user(&actor, &domain, &stored, Action::Write).await?;

        self.store.users().update(user).await?;
        tracing::debug!("Updated user {}", user.id);
        Ok(())
    }

    /// Drop the user's memberships in the current domain, then soft delete
    pub async fn delete_user(&self, user: &User) -> RbacResult<()> {
        let (actor, domain) = self.current().await?;
        let stored = self.existing_user(user).await?;
        self.require_user(&actor, &domain, &stored, Action::Write).await?;

        self.engine.remove_user_in_domain(&stored, &domain).await?;
        self.store.users().delete_by_id(stored.id).await?;

        tracing::debug!("Deleted user {}", stored.id);
        Ok(())
    }

    /// Members of the current domain the current user can read
    pub async fn get_users(&self) -> RbacResult<Vec<User>> {
        let (actor, domain) = self.current().await?;
        self.visible_users(&actor, &domain).await
    }

    /// Readable users with the readable roles they hold
    pub async fn get_all_roles_for_user(&self) -> RbacResult<Vec<RolesForUser>> {
        let (actor, domain) = self.current().await?;
        let users = self.visible_users(&actor, &domain).await?;
        let roles = by_id(self.visible_roles(&actor, &domain, Action::Read).await?);

        let mut result = Vec::with_capacity(users.len());
        for user in users {
            let held = self.engine.get_roles_for_user_in_domain(&user, &domain).await?;
            let roles = held
                .iter()
                .filter_map(|role| roles.get(&role.id).cloned())
                .collect();
            result.push(RolesForUser { user, roles });
        }
        Ok(result)
    }

    /// Replace the user's memberships with `target.roles`, limited to roles
    /// the current user can write
    pub async fn modify_roles_for_user(&self, target: &RolesForUser) -> RbacResult<()> {
        let (actor, domain) = self.current().await?;
        let user = self.existing_user(&target.user).await?;
        self.require_user(&actor, &domain, &user, Action::Write).await?;

        let current = ids(&self.engine.get_roles_for_user_in_domain(&user, &domain).await?);
        let desired = ids(&target.roles);
        let candidates = self.store.roles().get_by_ids(&union_ids(&current, &desired)).await?;
        let writable = by_id(
            self.filter(&actor, &domain, Action::Write, in_domain(candidates, &domain))
                .await?,
        );

        let source: Vec<u64> = current.into_iter().filter(|id| writable.contains_key(id)).collect();
        let target: Vec<u64> = desired.into_iter().filter(|id| writable.contains_key(id)).collect();
        let (add, remove) = diff(&source, &target);

        for id in &add {
            self.engine
                .add_role_for_user_in_domain(&user, &writable[id], &domain)
                .await?;
        }
        for id in &remove {
            self.engine
                .remove_role_for_user_in_domain(&user, &writable[id], &domain)
                .await?;
        }

        tracing::debug!(
            "Modified roles of user {}: {} added, {} removed",
            user.id,
            add.len(),
            remove.len()
        );
        Ok(())
    }

    /// Readable roles with the readable users holding them
    pub async fn get_all_users_for_role(&self) -> RbacResult<Vec<UsersForRole>> {
        let (actor, domain) = self.current().await?;
        let roles = self.visible_roles(&actor, &domain, Action::Read).await?;
        let users = by_id(self.visible_users(&actor, &domain).await?);

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let holders = self.engine.get_users_for_role_in_domain(&role, &domain).await?;
            let users = holders
                .iter()
                .filter_map(|user| users.get(&user.id).cloned())
                .collect();
            result.push(UsersForRole { role, users });
        }
        Ok(result)
    }

    /// Replace the role's holders with `target.users`, limited to users the
    /// current user can write
    pub async fn modify_users_for_role(&self, target: &UsersForRole) -> RbacResult<()> {
        ensure_id(&target.role)?;
        let (actor, domain) = self.current().await?;
        let role = self
            .active_role(target.role.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        self.checker().require(&actor, &domain, &role, Action::Write).await?;

        let current = ids(&self.engine.get_users_for_role_in_domain(&role, &domain).await?);
        let desired = ids(&target.users);
        let candidates = self.store.users().get_by_ids(&union_ids(&current, &desired)).await?;

        let mut writable = Vec::with_capacity(candidates.len());
        for user in candidates {
            let held = self.held_roles(&user, &domain).await?;
            if self.checker().check_user(&actor, &domain, &held, Action::Write).await? {
                writable.push(user);
            }
        }
        let writable = by_id(writable);

        let source: Vec<u64> = current.into_iter().filter(|id| writable.contains_key(id)).collect();
        let target: Vec<u64> = desired.into_iter().filter(|id| writable.contains_key(id)).collect();
        let (add, remove) = diff(&source, &target);

        for id in &add {
            self.engine
                .add_role_for_user_in_domain(&writable[id], &role, &domain)
                .await?;
        }
        for id in &remove {
            self.engine
                .remove_role_for_user_in_domain(&writable[id], &role, &domain)
                .await?;
        }

        tracing::debug!(
            "Modified holders of role {}: {} added, {} removed",
            role.id,
            add.len(),
            remove.len()
        );
        Ok(())
    }

    /// Every readable (user, role) membership of the current domain
    pub async fn get_user_role_list(&self) -> RbacResult<Vec<UserRolePair>> {
        let pairs = self
            .get_all_roles_for_user()
            .await?
            .into_iter()
            .flat_map(|entry| {
                let user = entry.user;
                entry
                    .roles
                    .into_iter()
                    .map(move |role| UserRolePair::new(user.clone(), role))
            })
            .collect();
        Ok(pairs)
    }

    /// [`modify_users_for_role`](Self::modify_users_for_role) from pairs that
    /// must all name `role`
    pub async fn modify_user_role_pair_per_role(
        &self,
        role: &Role,
        pairs: &[UserRolePair],
    ) -> RbacResult<()> {
        if pairs.iter().any(|pair| pair.role.id != role.id) {
            return Err(RbacError::InputArrayNotBelongSameRole);
        }
        let target = UsersForRole {
            role: role.clone(),
            users: pairs.iter().map(|pair| pair.user.clone()).collect(),
        };
        self.modify_users_for_role(&target).await
    }

    /// [`modify_roles_for_user`](Self::modify_roles_for_user) from pairs that
    /// must all name `user`
    pub async fn modify_user_role_pair_per_user(
        &self,
        user: &User,
        pairs: &[UserRolePair],
    ) -> RbacResult<()> {
        if pairs.iter().any(|pair| pair.user.id != user.id) {
            return Err(RbacError::InputArrayNotBelongSameUser);
        }
        let target = RolesForUser {
            user: user.clone(),
            roles: pairs.iter().map(|pair| pair.role.clone()).collect(),
        };
        self.modify_roles_for_user(&target).await
    }

    async fn existing_user(&self, user: &User) -> RbacResult<User> {
        ensure_id(user)?;
        self.active_user(user.id).await?.ok_or(RbacError::NotExists)
    }

    async fn require_user(
        &self,
        actor: &User,
        domain: &Domain,
        target: &User,
        action: Action,
    ) -> RbacResult<()> {
        let held = self.held_roles(target, domain).await?;
        self.checker().require_user(actor, domain, &held, action).await
    }

    async fn visible_users(&self, actor: &User, domain: &Domain) -> RbacResult<Vec<User>> {
        let members = ids(&self.engine.get_users_in_domain(domain).await?);
        let users = self.store.users().get_by_ids(&members).await?;

        let mut visible = Vec::with_capacity(users.len());
        for user in users {
            let held = self.held_roles(&user, domain).await?;
            if self.checker().check_user(actor, domain, &held, Action::Read).await? {
                visible.push(user);
            }
        }
        Ok(visible)
    }
}

/// Drop roles that belong to another domain
fn in_domain(roles: Vec<Role>, domain: &Domain) -> Vec<Role> {
    roles.into_iter().filter(|role| role.domain_id == domain.id).collect()
}
