//! Role to object grants

use super::{by_id, Executor};
use crate::diff::diff_policy;
use crate::error::{RbacError, RbacResult};
use crate::models::{Action, Domain, Object, PoliciesForRole, Policy, Role};
use crate::validation::ensure_id;

impl Executor {
    /// Readable roles with their grants on readable objects
    pub async fn get_all_policies_for_role(&self) -> RbacResult<Vec<PoliciesForRole>> {
        let (actor, domain) = self.current().await?;
        let roles = self.visible_roles(&actor, &domain, Action::Read).await?;
        let objects = by_id(self.visible_objects(&actor, &domain, Action::Read).await?);

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let granted = self.engine.get_policies_for_role_in_domain(&role, &domain).await?;
            let policies = granted
                .iter()
                .filter_map(|policy| {
                    let object = objects.get(&policy.object.id)?;
                    Some(Policy::new(role.clone(), object.clone(), domain.clone(), policy.action))
                })
                .collect();
            result.push(PoliciesForRole { role, policies });
        }
        Ok(result)
    }

    pub async fn modify_policies_for_role(&self, target: &PoliciesForRole) -> RbacResult<()> {
        self.modify_policy_list_per_role(&target.role, &target.policies).await
    }

    /// Every grant of the current domain whose role and object are readable
    pub async fn get_policy_list(&self) -> RbacResult<Vec<Policy>> {
        let policies = self
            .get_all_policies_for_role()
            .await?
            .into_iter()
            .flat_map(|entry| entry.policies)
            .collect();
        Ok(policies)
    }

    /// Grants of a readable role, limited to readable objects
    pub async fn get_policy_list_by_role(&self, role: &Role) -> RbacResult<Vec<Policy>> {
        ensure_id(role)?;
        let (actor, domain) = self.current().await?;
        let role = self.active_role(role.id, &domain).await?.ok_or(RbacError::NotExists)?;
        self.checker().require(&actor, &domain, &role, Action::Read).await?;

        let objects = by_id(self.visible_objects(&actor, &domain, Action::Read).await?);
        let granted = self.engine.get_policies_for_role_in_domain(&role, &domain).await?;
        Ok(granted
            .iter()
            .filter_map(|policy| {
                let object = objects.get(&policy.object.id)?;
                Some(Policy::new(role.clone(), object.clone(), domain.clone(), policy.action))
            })
            .collect())
    }

    /// Grants on a readable object, limited to readable roles
    pub async fn get_policy_list_by_object(&self, object: &Object) -> RbacResult<Vec<Policy>> {
        ensure_id(object)?;
        let (actor, domain) = self.current().await?;
        let object = self
            .active_object(object.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        self.checker().require(&actor, &domain, &object, Action::Read).await?;

        let roles = by_id(self.visible_roles(&actor, &domain, Action::Read).await?);
        let granted = self.engine.get_policies_for_object_in_domain(&object, &domain).await?;
        Ok(granted
            .iter()
            .filter_map(|policy| {
                let role = roles.get(&policy.role.id)?;
                Some(Policy::new(role.clone(), object.clone(), domain.clone(), policy.action))
            })
            .collect())
    }

    /// Make `policies` the full grant list of `role`, within the objects the
    /// current user can write. Grants on other objects are left alone.
    pub async fn modify_policy_list_per_role(
        &self,
        role: &Role,
        policies: &[Policy],
    ) -> RbacResult<()> {
        ensure_id(role)?;
        if policies.iter().any(|policy| policy.role.id != role.id) {
            return Err(RbacError::InputPolicyListNotBelongSameRole);
        }
        let (actor, domain) = self.current().await?;
        let role = self.active_role(role.id, &domain).await?.ok_or(RbacError::NotExists)?;
        self.checker().require(&actor, &domain, &role, Action::Write).await?;

        let objects = self.store.get_objects_in_domain(&domain).await?;
        let writable = by_id(self.filter(&actor, &domain, Action::Write, objects).await?);

        let source: Vec<Policy> = self
            .engine
            .get_policies_for_role_in_domain(&role, &domain)
            .await?
            .into_iter()
            .filter(|policy| writable.contains_key(&policy.object.id))
            .collect();
        let target = normalize(policies, &domain, |policy| {
            let object = writable.get(&policy.object.id)?;
            Some((role.clone(), object.clone()))
        });

        self.apply_policy_diff(&source, &target, &domain).await?;
        tracing::debug!("Modified policies of role {} in domain {}", role.id, domain.id);
        Ok(())
    }

    /// Make `policies` the full grant list on `object`, within the roles the
    /// current user can write. Grants of other roles are left alone.
    pub async fn modify_policy_list_per_object(
        &self,
        object: &Object,
        policies: &[Policy],
    ) -> RbacResult<()> {
        ensure_id(object)?;
        if policies.iter().any(|policy| policy.object.id != object.id) {
            return Err(RbacError::InputPolicyListNotBelongSameObject);
        }
        let (actor, domain) = self.current().await?;
        let object = self
            .active_object(object.id, &domain)
            .await?
            .ok_or(RbacError::NotExists)?;
        self.checker().require(&actor, &domain, &object, Action::Write).await?;

        let roles = self.store.get_roles_in_domain(&domain).await?;
        let writable = by_id(self.filter(&actor, &domain, Action::Write, roles).await?);

        let source: Vec<Policy> = self
            .engine
            .get_policies_for_object_in_domain(&object, &domain)
            .await?
            .into_iter()
            .filter(|policy| writable.contains_key(&policy.role.id))
            .collect();
        let target = normalize(policies, &domain, |policy| {
            let role = writable.get(&policy.role.id)?;
            Some((role.clone(), object.clone()))
        });

        self.apply_policy_diff(&source, &target, &domain).await?;
        tracing::debug!("Modified policies on object {} in domain {}", object.id, domain.id);
        Ok(())
    }

    async fn apply_policy_diff(
        &self,
        source: &[Policy],
        target: &[Policy],
        domain: &Domain,
    ) -> RbacResult<()> {
        let (add, remove) = diff_policy(source, target);
        for policy in &add {
            self.engine
                .add_policy_in_domain(&policy.role, &policy.object, domain, policy.action)
                .await?;
        }
        for policy in &remove {
            self.engine
                .remove_policy_in_domain(&policy.role, &policy.object, domain, policy.action)
                .await?;
        }

        if !add.is_empty() || !remove.is_empty() {
            tracing::debug!("Applied policy diff: {} added, {} removed", add.len(), remove.len());
        }
        Ok(())
    }
}

/// Rebuild input policies from stored entries in the current domain,
/// dropping those `resolve` rejects
fn normalize<F>(policies: &[Policy], domain: &Domain, resolve: F) -> Vec<Policy>
where
    F: Fn(&Policy) -> Option<(Role, Object)>,
{
    policies
        .iter()
        .filter_map(|policy| {
            let (role, object) = resolve(policy)?;
            Some(Policy::new(role, object, domain.clone(), policy.action))
        })
        .collect()
}
