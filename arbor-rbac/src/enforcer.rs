//! Enforcement engine backed by Casbin
//!
//! Rule layout, all scoped by the encoded domain:
//!
//! - `p = role, domain, object, action`
//! - `g = user, role, domain` for memberships
//! - `g = parent_role, child_role, domain` for the role tree
//! - `g2 = child_object, parent_object, domain` for the object tree
//! - `g = user, superadmin, superdomain` for superadmins

use async_trait::async_trait;
use casbin::{Adapter, CoreApi, Enforcer, MgmtApi};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::RbacConfig;
use crate::engine::EnforcementEngine;
use crate::error::RbacResult;
use crate::model::{ModelCache, SUPERADMIN_DOMAIN, SUPERADMIN_ROLE};
use crate::models::{Action, Domain, Entry, EntryFactory, Object, Policy, Role, User};

const ROLE_GROUP: &str = "g";
const OBJECT_GROUP: &str = "g2";

/// Casbin enforcer shared behind an async lock
#[derive(Clone)]
pub struct RbacEnforcer {
    enforcer: Arc<RwLock<Enforcer>>,
    factory: Arc<dyn EntryFactory>,
}

impl RbacEnforcer {
    /// Wrap an existing casbin enforcer
    pub fn new(enforcer: Enforcer, factory: Arc<dyn EntryFactory>) -> Self {
        Self {
            enforcer: Arc::new(RwLock::new(enforcer)),
            factory,
        }
    }

    /// Build an enforcer over `adapter` with the cached model for `config`
    pub async fn with_adapter<A>(
        adapter: A,
        config: &RbacConfig,
        models: &ModelCache,
        factory: Arc<dyn EntryFactory>,
    ) -> RbacResult<Self>
    where
        A: Adapter + 'static,
    {
        let model = models.get(config).await?;
        let mut enforcer = Enforcer::new(model, adapter).await?;
        enforcer.load_policy().await?;

        tracing::debug!(
            "Casbin enforcer ready (superadmin enabled: {})",
            config.superadmin_enabled
        );
        Ok(Self::new(enforcer, factory))
    }

    /// Persist the in-memory rules through the adapter
    pub async fn save_policy(&self) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer.save_policy().await?;
        Ok(())
    }

    /// Replace the in-memory rules with the adapter's
    pub async fn reload_policy(&self) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer.load_policy().await?;
        Ok(())
    }

    async fn grouping_in_domain(&self, ptype: &str, domain: &Domain) -> Vec<Vec<String>> {
        let enforcer = self.enforcer.read().await;
        enforcer.get_filtered_named_grouping_policy(ptype, 2, vec![domain.encode()])
    }

    async fn add_grouping(&self, ptype: &str, rule: Vec<String>) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer.add_named_grouping_policy(ptype, rule).await?;
        Ok(())
    }

    async fn remove_grouping(&self, ptype: &str, rule: Vec<String>) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer.remove_named_grouping_policy(ptype, rule).await?;
        Ok(())
    }

    async fn remove_groupings(&self, ptype: &str, rules: Vec<Vec<String>>) -> RbacResult<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let mut enforcer = self.enforcer.write().await;
        for rule in rules {
            enforcer.remove_named_grouping_policy(ptype, rule).await?;
        }
        Ok(())
    }

    fn decode_user(&self, encoded: &str) -> Option<User> {
        let mut user = self.factory.new_user();
        user.decode(encoded).ok().map(|_| user)
    }

    fn decode_role(&self, encoded: &str) -> Option<Role> {
        let mut role = self.factory.new_role();
        role.decode(encoded).ok().map(|_| role)
    }

    fn decode_object(&self, encoded: &str) -> Option<Object> {
        let mut object = self.factory.new_object();
        object.decode(encoded).ok().map(|_| object)
    }

    /// Rebuild a `p` rule; rules that do not decode are skipped
    fn decode_policy(&self, rule: &[String], domain: &Domain) -> Option<Policy> {
        let [role, _, object, action] = rule else {
            return None;
        };
        let mut role = self.decode_role(role)?;
        let mut object = self.decode_object(object)?;
        role.domain_id = domain.id;
        object.domain_id = domain.id;
        let action = action.parse().ok()?;
        Some(Policy::new(role, object, domain.clone(), action))
    }

    fn policy_rule(role: &Role, object: &Object, domain: &Domain, action: Action) -> Vec<String> {
        vec![
            role.encode(),
            domain.encode(),
            object.encode(),
            action.as_str().to_string(),
        ]
    }

    fn superadmin_rule(user: &User) -> Vec<String> {
        vec![
            user.encode(),
            SUPERADMIN_ROLE.to_string(),
            SUPERADMIN_DOMAIN.to_string(),
        ]
    }
}

/// Keep the first occurrence of each id
fn dedup_by_id<E: Entry>(entries: Vec<E>) -> Vec<E> {
    let mut seen = HashSet::new();
    entries.into_iter().filter(|e| seen.insert(e.id())).collect()
}

#[async_trait]
impl EnforcementEngine for RbacEnforcer {
    async fn enforce(
        &self,
        user: &User,
        domain: &Domain,
        object: &Object,
        action: Action,
    ) -> RbacResult<bool> {
        let enforcer = self.enforcer.read().await;
        let allowed = enforcer.enforce((
            user.encode(),
            domain.encode(),
            object.encode(),
            action.as_str().to_string(),
        ))?;
        Ok(allowed)
    }

    async fn is_superadmin(&self, user: &User) -> RbacResult<bool> {
        let enforcer = self.enforcer.read().await;
        let rules =
            enforcer.get_filtered_named_grouping_policy(ROLE_GROUP, 0, Self::superadmin_rule(user));
        Ok(!rules.is_empty())
    }

    async fn add_superadmin(&self, user: &User) -> RbacResult<()> {
        self.add_grouping(ROLE_GROUP, Self::superadmin_rule(user)).await
    }

    async fn remove_superadmin(&self, user: &User) -> RbacResult<()> {
        self.remove_grouping(ROLE_GROUP, Self::superadmin_rule(user)).await
    }

    async fn get_superadmins(&self) -> RbacResult<Vec<User>> {
        let enforcer = self.enforcer.read().await;
        let users = enforcer
            .get_filtered_named_grouping_policy(
                ROLE_GROUP,
                1,
                vec![SUPERADMIN_ROLE.to_string(), SUPERADMIN_DOMAIN.to_string()],
            )
            .iter()
            .filter_map(|rule| self.decode_user(&rule[0]))
            .collect();
        Ok(dedup_by_id(users))
    }

    async fn get_roles_for_user_in_domain(
        &self,
        user: &User,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        let encoded = user.encode();
        let roles = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[0] == encoded)
            .filter_map(|rule| self.decode_role(&rule[1]))
            .collect();
        Ok(dedup_by_id(roles))
    }

    async fn get_users_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<User>> {
        let encoded = role.encode();
        let users = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[1] == encoded)
            .filter_map(|rule| self.decode_user(&rule[0]))
            .collect();
        Ok(dedup_by_id(users))
    }

    async fn add_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.add_grouping(ROLE_GROUP, vec![user.encode(), role.encode(), domain.encode()])
            .await
    }

    async fn remove_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.remove_grouping(ROLE_GROUP, vec![user.encode(), role.encode(), domain.encode()])
            .await
    }

    async fn remove_user_in_domain(&self, user: &User, domain: &Domain) -> RbacResult<()> {
        let encoded = user.encode();
        let rules = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .into_iter()
            .filter(|rule| rule[0] == encoded)
            .collect();
        self.remove_groupings(ROLE_GROUP, rules).await
    }

    async fn remove_users_in_domain(&self, domain: &Domain) -> RbacResult<()> {
        let rules = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .into_iter()
            .filter(|rule| self.decode_user(&rule[0]).is_some())
            .collect();
        self.remove_groupings(ROLE_GROUP, rules).await
    }

    async fn get_users_in_domain(&self, domain: &Domain) -> RbacResult<Vec<User>> {
        let users = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter_map(|rule| self.decode_user(&rule[0]))
            .collect();
        Ok(dedup_by_id(users))
    }

    async fn get_roles_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Role>> {
        let roles = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter_map(|rule| {
                let parent = self.decode_role(&rule[0])?;
                let mut child = self.decode_role(&rule[1])?;
                child.parent_id = parent.id;
                child.domain_id = domain.id;
                Some(child)
            })
            .collect();
        Ok(roles)
    }

    async fn get_objects_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Object>> {
        let objects = self
            .grouping_in_domain(OBJECT_GROUP, domain)
            .await
            .iter()
            .filter_map(|rule| {
                let mut child = self.decode_object(&rule[0])?;
                let parent = self.decode_object(&rule[1])?;
                child.parent_id = parent.id;
                child.domain_id = domain.id;
                Some(child)
            })
            .collect();
        Ok(objects)
    }

    async fn get_parents_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        let encoded = role.encode();
        let parents = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[1] == encoded)
            .filter_map(|rule| self.decode_role(&rule[0]))
            .collect();
        Ok(dedup_by_id(parents))
    }

    async fn get_children_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        let encoded = role.encode();
        let children = self
            .grouping_in_domain(ROLE_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[0] == encoded)
            .filter_map(|rule| self.decode_role(&rule[1]))
            .collect();
        Ok(dedup_by_id(children))
    }

    async fn add_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.add_grouping(ROLE_GROUP, vec![parent.encode(), role.encode(), domain.encode()])
            .await
    }

    async fn remove_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.remove_grouping(ROLE_GROUP, vec![parent.encode(), role.encode(), domain.encode()])
            .await
    }

    async fn get_parents_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>> {
        let encoded = object.encode();
        let parents = self
            .grouping_in_domain(OBJECT_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[0] == encoded)
            .filter_map(|rule| self.decode_object(&rule[1]))
            .collect();
        Ok(dedup_by_id(parents))
    }

    async fn get_children_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>> {
        let encoded = object.encode();
        let children = self
            .grouping_in_domain(OBJECT_GROUP, domain)
            .await
            .iter()
            .filter(|rule| rule[1] == encoded)
            .filter_map(|rule| self.decode_object(&rule[0]))
            .collect();
        Ok(dedup_by_id(children))
    }

    async fn add_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.add_grouping(OBJECT_GROUP, vec![object.encode(), parent.encode(), domain.encode()])
            .await
    }

    async fn remove_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.remove_grouping(OBJECT_GROUP, vec![object.encode(), parent.encode(), domain.encode()])
            .await
    }

    async fn get_policies_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>> {
        let enforcer = self.enforcer.read().await;
        let policies = enforcer
            .get_filtered_policy(0, vec![role.encode(), domain.encode()])
            .iter()
            .filter_map(|rule| self.decode_policy(rule, domain))
            .collect();
        Ok(policies)
    }

    async fn get_policies_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>> {
        let enforcer = self.enforcer.read().await;
        let policies = enforcer
            .get_filtered_policy(1, vec![domain.encode(), object.encode()])
            .iter()
            .filter_map(|rule| self.decode_policy(rule, domain))
            .collect();
        Ok(policies)
    }

    async fn get_policies_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Policy>> {
        let enforcer = self.enforcer.read().await;
        let policies = enforcer
            .get_filtered_policy(1, vec![domain.encode()])
            .iter()
            .filter_map(|rule| self.decode_policy(rule, domain))
            .collect();
        Ok(policies)
    }

    async fn add_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer
            .add_policy(Self::policy_rule(role, object, domain, action))
            .await?;
        Ok(())
    }

    async fn remove_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer
            .remove_policy(Self::policy_rule(role, object, domain, action))
            .await?;
        Ok(())
    }
}
