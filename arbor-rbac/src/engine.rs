//! Enforcement engine contract
//!
//! The engine owns rule storage and evaluation. Every call is scoped to one
//! domain except superadmin membership, which lives in a reserved domain.
//! Adding an existing edge or policy and removing an absent one both succeed
//! without effect.

use async_trait::async_trait;

use crate::error::RbacResult;
use crate::models::{Action, Domain, Object, Policy, Role, User};

#[async_trait]
pub trait EnforcementEngine: Send + Sync {
    /// Evaluate (user, domain, object, action) against the stored policies
    async fn enforce(
        &self,
        user: &User,
        domain: &Domain,
        object: &Object,
        action: Action,
    ) -> RbacResult<bool>;

    async fn is_superadmin(&self, user: &User) -> RbacResult<bool>;

    async fn add_superadmin(&self, user: &User) -> RbacResult<()>;

    async fn remove_superadmin(&self, user: &User) -> RbacResult<()>;

    async fn get_superadmins(&self) -> RbacResult<Vec<User>>;

    async fn get_roles_for_user_in_domain(
        &self,
        user: &User,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>>;

    async fn get_users_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<User>>;

    async fn add_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()>;

    async fn remove_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()>;

    /// Drop every membership the user holds in the domain
    async fn remove_user_in_domain(&self, user: &User, domain: &Domain) -> RbacResult<()>;

    /// Drop every membership held in the domain
    async fn remove_users_in_domain(&self, domain: &Domain) -> RbacResult<()>;

    async fn get_users_in_domain(&self, domain: &Domain) -> RbacResult<Vec<User>>;

    /// Roles that have a parent edge in the domain, with `parent_id` set
    async fn get_roles_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Role>>;

    /// Objects that have a parent edge in the domain, with `parent_id` set
    async fn get_objects_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Object>>;

    async fn get_parents_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>>;

    async fn get_children_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>>;

    async fn add_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()>;

    async fn remove_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()>;

    async fn get_parents_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>>;

    async fn get_children_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>>;

    async fn add_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()>;

    async fn remove_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()>;

    async fn get_policies_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>>;

    async fn get_policies_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>>;

    async fn get_policies_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Policy>>;

    async fn add_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()>;

    async fn remove_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()>;
}
