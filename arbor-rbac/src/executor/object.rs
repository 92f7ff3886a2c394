//! Object workflows

use super::Executor;
use crate::error::{RbacError, RbacResult};
use crate::models::{Action, Domain, Object, ObjectType, ParentEntry, User};
use crate::store::Presence;
use crate::tree::{annotate_parents, build_parent_map, detach_all, ensure_acyclic, reparent};
use crate::validation::ensure_id;

impl Executor {
    /// Readable objects of the current domain, optionally of one type
    pub async fn get_objects(&self, object_type: Option<&ObjectType>) -> RbacResult<Vec<Object>> {
        let (user, domain) = self.current().await?;
        let mut objects = self.visible_objects(&user, &domain, Action::Read).await?;
        if let Some(ty) = object_type {
            objects.retain(|object| object.object_type() == ty);
        }
        Ok(objects)
    }

    pub async fn create_object(&self, mut object: Object) -> RbacResult<Object> {
        let (user, domain) = self.current().await?;
        object.domain_id = domain.id;

        if !self.store.objects().take(&object).await?.is_absent() {
            return Err(RbacError::AlreadyExists);
        }
        self.check_object_parent(&user, &domain, &object).await?;

        self.store.objects().create(&mut object).await?;
        reparent(&self.object_tree(), &object, &domain).await?;

        tracing::debug!("Created object {} in domain {}", object.id, domain.id);
        Ok(object)
    }

    /// Update name or parent; the object type never changes
    pub async fn update_object(&self, mut object: Object) -> RbacResult<()> {
        ensure_id(&object)?;
        let (user, domain) = self.current().await?;
        let stored = self
            .active_object(object.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        object.domain_id = domain.id;

        if object.object_type() != stored.object_type() {
            return Err(RbacError::InvalidObjectType);
        }
        self.check(&stored, Action::Write).await?;
        if stored.is_root() {
            self.check_root(&user).await?;
        }
        if object.parent_id != stored.parent_id {
            self.check_object_parent(&user, &domain, &object).await?;
        }
        ensure_acyclic(&self.object_tree(), object.id, object.parent_id, &domain).await?;

        self.store.objects().update(&object).await?;
        reparent(&self.object_tree(), &object, &domain).await?;

        tracing::debug!("Updated object {} in domain {}", object.id, domain.id);
        Ok(())
    }

    /// Soft delete an object and detach it from its parent. Grants on it and
    /// its child edges stay in place.
    pub async fn delete_object(&self, object: &Object) -> RbacResult<()> {
        ensure_id(object)?;
        let (user, domain) = self.current().await?;
        let stored = self
            .active_object(object.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;

        self.check(&stored, Action::Write).await?;
        if stored.is_root() {
            self.check_root(&user).await?;
        }

        detach_all(&self.object_tree(), &stored, &domain).await?;
        self.store.objects().delete_by_id(stored.id).await?;

        tracing::debug!("Deleted object {} in domain {}", stored.id, domain.id);
        Ok(())
    }

    /// Bring back a soft-deleted object under its stored parent, which must
    /// be live and writable
    pub async fn recover_object(&self, mut object: Object) -> RbacResult<Object> {
        let (user, domain) = self.current().await?;
        object.domain_id = domain.id;

        let stored = match self.store.objects().take(&object).await? {
            Presence::Deleted(stored) if stored.domain_id == domain.id => stored,
            Presence::Active(_) => return Err(RbacError::AlreadyExists),
            _ => return Err(RbacError::NotExists),
        };

        // the object lost its inherited grants when it was detached
        self.check_object_parent(&user, &domain, &stored).await?;

        let mut recovered = stored;
        self.store.objects().recover(&mut recovered).await?;
        reparent(&self.object_tree(), &recovered, &domain).await?;

        tracing::debug!("Recovered object {} in domain {}", recovered.id, domain.id);
        Ok(recovered)
    }

    /// A root object needs a superadmin; any other parent must be a live
    /// object the user can write
    async fn check_object_parent(
        &self,
        user: &User,
        domain: &Domain,
        object: &Object,
    ) -> RbacResult<()> {
        if object.is_root() {
            return self.check_root(user).await;
        }

        let parent = self
            .active_object(object.parent_id, domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        self.checker().require(user, domain, &parent, Action::Write).await
    }

    pub(super) async fn visible_objects(
        &self,
        user: &User,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<Vec<Object>> {
        let parents = build_parent_map(&self.engine.get_objects_in_domain(domain).await?);
        let objects = self.store.get_objects_in_domain(domain).await?;
        let mut objects = self.filter(user, domain, action, objects).await?;
        annotate_parents(&mut objects, &parents);
        Ok(objects)
    }
}
