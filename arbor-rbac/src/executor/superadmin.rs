//! Superadmin membership

use super::{ids, Executor};
use crate::error::{RbacError, RbacResult};
use crate::models::User;
use crate::validation::ensure_id;

impl Executor {
    /// Grant superadmin to an active user. The first superadmin needs no
    /// current context; afterwards only a superadmin can add another.
    pub async fn add_superadmin_user(&self, user: &User) -> RbacResult<()> {
        self.ensure_superadmin_enabled()?;
        ensure_id(user)?;
        let user = self.active_user(user.id).await?.ok_or(RbacError::NotExists)?;

        if !self.engine.get_superadmins().await?.is_empty() {
            self.require_superadmin().await?;
        }

        self.engine.add_superadmin(&user).await?;
        tracing::info!("Granted superadmin to user {}", user.id);
        Ok(())
    }

    pub async fn delete_superadmin_user(&self, user: &User) -> RbacResult<()> {
        self.ensure_superadmin_enabled()?;
        ensure_id(user)?;
        self.require_superadmin().await?;

        self.engine.remove_superadmin(user).await?;
        tracing::info!("Revoked superadmin from user {}", user.id);
        Ok(())
    }

    pub async fn get_all_superadmin_user(&self) -> RbacResult<Vec<User>> {
        self.ensure_superadmin_enabled()?;
        self.require_superadmin().await?;

        let superadmins = ids(&self.engine.get_superadmins().await?);
        self.store.users().get_by_ids(&superadmins).await
    }

    fn ensure_superadmin_enabled(&self) -> RbacResult<()> {
        if self.superadmin_enabled {
            Ok(())
        } else {
            Err(RbacError::SuperadminNotEnabled)
        }
    }

    async fn require_superadmin(&self) -> RbacResult<()> {
        let (actor, _) = self.current().await?;
        if self.checker().is_superadmin(&actor).await? {
            return Ok(());
        }
        tracing::warn!("User {} is not a superadmin", actor.id);
        Err(RbacError::NotSuperadmin)
    }
}
