//! Permission checking utilities

use crate::{
    engine::EnforcementEngine,
    error::{RbacError, RbacResult},
    models::{Action, Domain, EntryFactory, ObjectData, Role, User},
};

/// Permission checker translating entries and actions into engine decisions
#[derive(Clone, Copy)]
pub struct PermissionChecker<'a> {
    engine: &'a dyn EnforcementEngine,
    factory: &'a dyn EntryFactory,
    superadmin_enabled: bool,
}

impl<'a> PermissionChecker<'a> {
    /// Create a new permission checker
    pub fn new(
        engine: &'a dyn EnforcementEngine,
        factory: &'a dyn EntryFactory,
        superadmin_enabled: bool,
    ) -> Self {
        Self {
            engine,
            factory,
            superadmin_enabled,
        }
    }

    /// Check if `user` may perform `action` on the object governing `item`
    pub async fn check<D: ObjectData + ?Sized>(
        &self,
        user: &User,
        domain: &Domain,
        item: &D,
        action: Action,
    ) -> RbacResult<bool> {
        let mut object = self.factory.new_object();
        object.id = item.object_id();
        object.domain_id = domain.id;
        self.engine.enforce(user, domain, &object, action).await
    }

    /// Like [`check`](Self::check), turning a denial into the matching error
    pub async fn require<D: ObjectData + ?Sized>(
        &self,
        user: &User,
        domain: &Domain,
        item: &D,
        action: Action,
    ) -> RbacResult<()> {
        if self.check(user, domain, item, action).await? {
            return Ok(());
        }

        tracing::warn!(
            "User {} denied {} on object {} in domain {}",
            user.id,
            action.as_str(),
            item.object_id(),
            domain.id
        );
        Err(denied(action))
    }

    /// Keep the items `user` may perform `action` on, in their original order
    pub async fn filter<D: ObjectData>(
        &self,
        user: &User,
        domain: &Domain,
        action: Action,
        items: Vec<D>,
    ) -> RbacResult<Vec<D>> {
        let mut allowed = Vec::with_capacity(items.len());
        for item in items {
            if self.check(user, domain, &item, action).await? {
                allowed.push(item);
            }
        }
        Ok(allowed)
    }

    /// Whether `actor` is a superadmin and the bypass is enabled
    pub async fn is_superadmin(&self, actor: &User) -> RbacResult<bool> {
        if !self.superadmin_enabled {
            return Ok(false);
        }
        self.engine.is_superadmin(actor).await
    }

    /// Check access to a user account.
    ///
    /// Users carry no governing object of their own. A target holding roles
    /// in the domain is reachable through any of those roles' objects; a
    /// target holding none is reachable by any member of the domain.
    pub async fn check_user(
        &self,
        actor: &User,
        domain: &Domain,
        target_roles: &[Role],
        action: Action,
    ) -> RbacResult<bool> {
        if self.is_superadmin(actor).await? {
            return Ok(true);
        }

        if target_roles.is_empty() {
            let held = self.engine.get_roles_for_user_in_domain(actor, domain).await?;
            return Ok(!held.is_empty());
        }

        for role in target_roles {
            if self.check(actor, domain, role, action).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Like [`check_user`](Self::check_user), turning a denial into the
    /// matching error
    pub async fn require_user(
        &self,
        actor: &User,
        domain: &Domain,
        target_roles: &[Role],
        action: Action,
    ) -> RbacResult<()> {
        if self.check_user(actor, domain, target_roles, action).await? {
            return Ok(());
        }

        tracing::warn!(
            "User {} denied {} on user account in domain {}",
            actor.id,
            action.as_str(),
            domain.id
        );
        Err(denied(action))
    }
}

/// Error reported when `action` is refused
pub fn denied(action: Action) -> RbacError {
    match action {
        Action::Read => RbacError::NoReadPermission,
        Action::Write => RbacError::NoWritePermission,
    }
}
