//! Current-context providers
//!
//! Every permission check is scoped by the acting user and the active domain.
//! A provider resolves that pair for the request being served.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::{RbacError, RbacResult};
use crate::models::{Domain, User};

/// Supplies the (current user, current domain) pair
#[async_trait]
pub trait CurrentProvider: Send + Sync {
    async fn get(&self) -> RbacResult<(User, Domain)>;
}

#[async_trait]
impl<P: CurrentProvider + ?Sized> CurrentProvider for Arc<P> {
    async fn get(&self) -> RbacResult<(User, Domain)> {
        (**self).get().await
    }
}

/// Provider holding an explicitly set user and domain
#[derive(Debug, Default)]
pub struct StaticProvider {
    user: RwLock<Option<User>>,
    domain: RwLock<Option<Domain>>,
}

impl StaticProvider {
    pub fn new(user: Option<User>, domain: Option<Domain>) -> Self {
        Self {
            user: RwLock::new(user),
            domain: RwLock::new(domain),
        }
    }

    pub fn set_user(&self, user: Option<User>) {
        *self.user.write() = user;
    }

    pub fn set_domain(&self, domain: Option<Domain>) {
        *self.domain.write() = domain;
    }
}

#[async_trait]
impl CurrentProvider for StaticProvider {
    async fn get(&self) -> RbacResult<(User, Domain)> {
        let user = self.user.read().clone();
        let domain = self.domain.read().clone();
        match (user, domain) {
            (Some(user), Some(domain)) => Ok((user, domain)),
            _ => Err(RbacError::ProviderGet),
        }
    }
}

/// Memoizes the upstream pair for the lifetime of one request.
///
/// Failed lookups are not cached. Build one per request; sharing it across
/// requests would leak one caller's context into another's.
pub struct CachedProvider<P> {
    upstream: P,
    cached: Mutex<Option<(User, Domain)>>,
}

impl<P: CurrentProvider> CachedProvider<P> {
    pub fn new(upstream: P) -> Self {
        Self {
            upstream,
            cached: Mutex::new(None),
        }
    }

    /// Drop the memoized pair so the next call asks upstream again
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }
}

#[async_trait]
impl<P: CurrentProvider> CurrentProvider for CachedProvider<P> {
    async fn get(&self) -> RbacResult<(User, Domain)> {
        if let Some(pair) = self.cached.lock().clone() {
            return Ok(pair);
        }

        let pair = self.upstream.get().await?;
        *self.cached.lock() = Some(pair.clone());
        Ok(pair)
    }
}
