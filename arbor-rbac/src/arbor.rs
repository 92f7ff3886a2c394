//! Top-level authorization system and its construction options

use casbin::Adapter;
use std::sync::Arc;

use crate::config::RbacConfig;
use crate::context::CurrentProvider;
use crate::enforcer::RbacEnforcer;
use crate::engine::EnforcementEngine;
use crate::error::{RbacError, RbacResult};
use crate::executor::Executor;
use crate::model::ModelCache;
use crate::models::EntryFactory;
use crate::seed::DomainCreator;
use crate::store::MetadataStore;

/// Collaborators and settings an [`Arbor`] is built from
#[derive(Clone, Default)]
pub struct ArborOptions {
    pub config: RbacConfig,
    pub domain_creator: Option<Arc<dyn DomainCreator>>,
    pub enforcer: Option<Arc<dyn EnforcementEngine>>,
    pub entry_factory: Option<Arc<dyn EntryFactory>>,
    pub metadata_store: Option<Arc<dyn MetadataStore>>,
}

impl ArborOptions {
    pub fn new(config: RbacConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn domain_creator(mut self, creator: impl DomainCreator + 'static) -> Self {
        self.domain_creator = Some(Arc::new(creator));
        self
    }

    pub fn enforcer(mut self, enforcer: impl EnforcementEngine + 'static) -> Self {
        self.enforcer = Some(Arc::new(enforcer));
        self
    }

    pub fn entry_factory(mut self, factory: impl EntryFactory + 'static) -> Self {
        self.entry_factory = Some(Arc::new(factory));
        self
    }

    pub fn metadata_store(mut self, store: impl MetadataStore + 'static) -> Self {
        self.metadata_store = Some(Arc::new(store));
        self
    }
}

/// Authorization system: validated collaborators plus the compiled model
/// cache they were built from. Hands out one [`Executor`] per request.
pub struct Arbor {
    config: RbacConfig,
    domain_creator: Arc<dyn DomainCreator>,
    engine: Arc<dyn EnforcementEngine>,
    factory: Arc<dyn EntryFactory>,
    store: Arc<dyn MetadataStore>,
    models: ModelCache,
}

impl Arbor {
    /// Validate `options`, failing on an invalid config or the first
    /// missing collaborator
    pub fn new(options: ArborOptions) -> RbacResult<Self> {
        options.config.validate()?;
        Self::assemble(options, ModelCache::new())
    }

    /// Like [`new`](Self::new), building a Casbin engine over `adapter` when
    /// `options` carries none
    pub async fn with_casbin<A>(mut options: ArborOptions, adapter: A) -> RbacResult<Self>
    where
        A: Adapter + 'static,
    {
        options.config.validate()?;
        let models = ModelCache::new();

        if options.enforcer.is_none() {
            let factory = options
                .entry_factory
                .clone()
                .ok_or(RbacError::InitializationNilEntryFactory)?;
            let engine =
                RbacEnforcer::with_adapter(adapter, &options.config, &models, factory).await?;
            options.enforcer = Some(Arc::new(engine));
        }

        Self::assemble(options, models)
    }

    fn assemble(options: ArborOptions, models: ModelCache) -> RbacResult<Self> {
        let domain_creator = options
            .domain_creator
            .ok_or(RbacError::InitializationNilDomainCreator)?;
        let engine = options.enforcer.ok_or(RbacError::InitializationNilEnforcer)?;
        let factory = options
            .entry_factory
            .ok_or(RbacError::InitializationNilEntryFactory)?;
        let store = options
            .metadata_store
            .ok_or(RbacError::InitializationNilMetadataStore)?;

        tracing::info!(
            "Authorization layer ready (superadmin enabled: {})",
            options.config.superadmin_enabled
        );

        Ok(Self {
            config: options.config,
            domain_creator,
            engine,
            factory,
            store,
            models,
        })
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn EnforcementEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// Compiled models owned by this instance
    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// Executor bound to `provider` for the current request
    pub fn executor(&self, provider: Arc<dyn CurrentProvider>) -> Executor {
        Executor::new(
            self.engine.clone(),
            self.store.clone(),
            self.factory.clone(),
            self.domain_creator.clone(),
            provider,
            self.config.superadmin_enabled,
        )
    }
}
