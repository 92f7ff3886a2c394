//! Domain lifecycle. Domains are bootstrapped by trusted callers, so none of
//! these workflows check permissions.

use super::Executor;
use crate::error::{RbacError, RbacResult};
use crate::models::Domain;
use crate::store::Presence;
use crate::tree::reparent;
use crate::validation::ensure_id;

impl Executor {
    /// Create a domain unknown to the store, then seed it
    pub async fn create_domain(&self, mut domain: Domain) -> RbacResult<Domain> {
        if !self.store.domains().take(&domain).await?.is_absent() {
            return Err(RbacError::AlreadyExists);
        }

        self.store.domains().create(&mut domain).await?;
        self.initialize_domain(&domain).await?;

        tracing::info!("Created domain {} ({})", domain.id, domain.name);
        Ok(domain)
    }

    /// Bring back a soft-deleted domain and seed it again
    pub async fn recover_domain(&self, mut domain: Domain) -> RbacResult<Domain> {
        match self.store.domains().take(&domain).await? {
            Presence::Active(_) => return Err(RbacError::AlreadyExists),
            Presence::Absent => return Err(RbacError::NotExists),
            Presence::Deleted(_) => {}
        }

        self.store.domains().recover(&mut domain).await?;
        self.initialize_domain(&domain).await?;

        tracing::info!("Recovered domain {} ({})", domain.id, domain.name);
        Ok(domain)
    }

    /// Soft delete a domain and drop every membership held in it. Roles,
    /// objects, their edges and policies stay for a later recovery.
    pub async fn delete_domain(&self, domain: &Domain) -> RbacResult<()> {
        let stored = self.existing_domain(domain).await?;

        self.engine.remove_users_in_domain(&stored).await?;
        self.store.domains().delete_by_id(stored.id).await?;

        tracing::info!("Deleted domain {} ({})", stored.id, stored.name);
        Ok(())
    }

    pub async fn update_domain(&self, domain: &Domain) -> RbacResult<()> {
        self.existing_domain(domain).await?;
        self.store.domains().update(domain).await?;

        tracing::debug!("Updated domain {}", domain.id);
        Ok(())
    }

    /// Run the seed again; entries and grants already present are kept
    pub async fn reinitialize_domain(&self, domain: &Domain) -> RbacResult<()> {
        let stored = self.existing_domain(domain).await?;
        self.initialize_domain(&stored).await?;

        tracing::info!("Reinitialized domain {} ({})", stored.id, stored.name);
        Ok(())
    }

    pub async fn get_all_domains(&self) -> RbacResult<Vec<Domain>> {
        self.store.get_all_domains().await
    }

    async fn existing_domain(&self, domain: &Domain) -> RbacResult<Domain> {
        ensure_id(domain)?;
        let mut template = self.factory.new_domain();
        template.id = domain.id;
        self.store
            .domains()
            .take(&template)
            .await?
            .active()
            .ok_or(RbacError::NotExists)
    }

    async fn initialize_domain(&self, domain: &Domain) -> RbacResult<()> {
        let mut seed = self.domain_creator.build(domain);

        for object in seed.objects.iter_mut() {
            self.store.objects().upsert(object).await?;
        }
        for role in seed.roles.iter_mut() {
            self.store.roles().upsert(role).await?;
        }

        self.domain_creator.relate(&mut seed);
        for role in seed.roles.iter_mut() {
            self.store.roles().upsert(role).await?;
        }
        for object in seed.objects.iter_mut() {
            self.store.objects().upsert(object).await?;
        }

        let objects = self.object_tree();
        for object in &seed.objects {
            reparent(&objects, object, domain).await?;
        }
        let roles = self.role_tree();
        for role in &seed.roles {
            reparent(&roles, role, domain).await?;
        }

        for policy in self.domain_creator.policies(&seed) {
            self.engine
                .add_policy_in_domain(&policy.role, &policy.object, &policy.domain, policy.action)
                .await?;
        }

        tracing::debug!(
            "Seeded domain {} with {} roles and {} objects",
            domain.id,
            seed.roles.len(),
            seed.objects.len()
        );
        Ok(())
    }
}
