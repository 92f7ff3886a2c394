//! Shared stage for the scenario tests
//!
//! One domain seeded by [`StandardDomainCreator`] with three users:
//! `superadmin` (only when the toggle is on), `admin` holding the `admin`
//! role and `member` holding the `member` role.

#![allow(dead_code)]

use std::sync::Arc;

use arbor_rbac::{
    Action, Arbor, ArborOptions, DefaultEntryFactory, Domain, EnforcementEngine, Executor,
    MemoryAdapter, MemoryStore, MetadataStore, ModelCache, Object, Policy, RbacConfig,
    RbacEnforcer, RbacResult, Role, StandardDomainCreator, StaticProvider, User, UserRolePair,
};
use async_trait::async_trait;
use parking_lot::Mutex;

pub struct Stage {
    pub arbor: Arbor,
    pub recorder: Arc<RecordingEngine>,
    pub provider: Arc<StaticProvider>,
    pub executor: Executor,
    pub domain: Domain,
    pub superadmin: User,
    pub admin: User,
    pub member: User,
}

impl Stage {
    pub async fn new() -> Self {
        Self::with_config(RbacConfig::default()).await
    }

    pub async fn with_config(config: RbacConfig) -> Self {
        let enabled = config.superadmin_enabled;
        let casbin = RbacEnforcer::with_adapter(
            MemoryAdapter::default(),
            &config,
            &ModelCache::new(),
            Arc::new(DefaultEntryFactory),
        )
        .await
        .unwrap();
        let recorder = Arc::new(RecordingEngine::new(casbin));

        let mut options = ArborOptions::new(config)
            .domain_creator(StandardDomainCreator)
            .entry_factory(DefaultEntryFactory)
            .metadata_store(MemoryStore::new());
        options.enforcer = Some(recorder.clone() as Arc<dyn EnforcementEngine>);
        let arbor = Arbor::new(options).unwrap();

        let provider = Arc::new(StaticProvider::default());
        let executor = arbor.executor(provider.clone());

        let domain = executor.create_domain(Domain::new("domain_01")).await.unwrap();
        executor.reinitialize_domain(&domain).await.unwrap();

        let superadmin = executor
            .create_user(User::new("superadmin", "superadmin@qq.com"))
            .await
            .unwrap();
        let admin = executor
            .create_user(User::new("admin", "admin@qq.com"))
            .await
            .unwrap();
        let member = executor
            .create_user(User::new("member", "member@qq.com"))
            .await
            .unwrap();
        provider.set_domain(Some(domain.clone()));

        let stage = Self {
            arbor,
            recorder,
            provider,
            executor,
            domain,
            superadmin,
            admin,
            member,
        };

        let admin_role = stage.role("admin").await;
        let member_role = stage.role("member").await;
        if enabled {
            stage.executor.add_superadmin_user(&stage.superadmin).await.unwrap();
            stage.act_as(&stage.superadmin);
            for (user, role) in [(&stage.admin, &admin_role), (&stage.member, &member_role)] {
                let pairs = [UserRolePair::new(user.clone(), role.clone())];
                stage
                    .executor
                    .modify_user_role_pair_per_role(role, &pairs)
                    .await
                    .unwrap();
            }
        } else {
            let engine = stage.arbor.engine();
            engine
                .add_role_for_user_in_domain(&stage.admin, &admin_role, &stage.domain)
                .await
                .unwrap();
            engine
                .add_role_for_user_in_domain(&stage.member, &member_role, &stage.domain)
                .await
                .unwrap();
            stage.act_as(&stage.admin);
        }

        stage.recorder.clear();
        stage
    }

    pub fn act_as(&self, user: &User) {
        self.provider.set_user(Some(user.clone()));
    }

    pub fn enter(&self, domain: &Domain) {
        self.provider.set_domain(Some(domain.clone()));
    }

    /// Stored role of the stage domain, looked up by name
    pub async fn role(&self, name: &str) -> Role {
        self.arbor
            .store()
            .get_roles_in_domain(&self.domain)
            .await
            .unwrap()
            .into_iter()
            .find(|role| role.name == name)
            .unwrap()
    }

    /// Stored object of the stage domain, looked up by name
    pub async fn object(&self, name: &str) -> Object {
        self.arbor
            .store()
            .get_objects_in_domain(&self.domain)
            .await
            .unwrap()
            .into_iter()
            .find(|object| object.name == name)
            .unwrap()
    }
}

pub fn role_names(roles: &[Role]) -> Vec<String> {
    sorted(roles.iter().map(|role| role.name.clone()))
}

pub fn object_names(objects: &[Object]) -> Vec<String> {
    sorted(objects.iter().map(|object| object.name.clone()))
}

pub fn user_names(users: &[User]) -> Vec<String> {
    sorted(users.iter().map(|user| user.name.clone()))
}

fn sorted(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = names.collect();
    names.sort();
    names
}

/// Engine wrapper logging every mutating call by method name
pub struct RecordingEngine {
    inner: RbacEnforcer,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingEngine {
    pub fn new(inner: RbacEnforcer) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn mutations(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl EnforcementEngine for RecordingEngine {
    async fn enforce(
        &self,
        user: &User,
        domain: &Domain,
        object: &Object,
        action: Action,
    ) -> RbacResult<bool> {
        self.inner.enforce(user, domain, object, action).await
    }

    async fn is_superadmin(&self, user: &User) -> RbacResult<bool> {
        self.inner.is_superadmin(user).await
    }

    async fn add_superadmin(&self, user: &User) -> RbacResult<()> {
        self.record("add_superadmin");
        self.inner.add_superadmin(user).await
    }

    async fn remove_superadmin(&self, user: &User) -> RbacResult<()> {
        self.record("remove_superadmin");
        self.inner.remove_superadmin(user).await
    }

    async fn get_superadmins(&self) -> RbacResult<Vec<User>> {
        self.inner.get_superadmins().await
    }

    async fn get_roles_for_user_in_domain(
        &self,
        user: &User,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        self.inner.get_roles_for_user_in_domain(user, domain).await
    }

    async fn get_users_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<User>> {
        self.inner.get_users_for_role_in_domain(role, domain).await
    }

    async fn add_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("add_role_for_user_in_domain");
        self.inner.add_role_for_user_in_domain(user, role, domain).await
    }

    async fn remove_role_for_user_in_domain(
        &self,
        user: &User,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("remove_role_for_user_in_domain");
        self.inner.remove_role_for_user_in_domain(user, role, domain).await
    }

    async fn remove_user_in_domain(&self, user: &User, domain: &Domain) -> RbacResult<()> {
        self.record("remove_user_in_domain");
        self.inner.remove_user_in_domain(user, domain).await
    }

    async fn remove_users_in_domain(&self, domain: &Domain) -> RbacResult<()> {
        self.record("remove_users_in_domain");
        self.inner.remove_users_in_domain(domain).await
    }

    async fn get_users_in_domain(&self, domain: &Domain) -> RbacResult<Vec<User>> {
        self.inner.get_users_in_domain(domain).await
    }

    async fn get_roles_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Role>> {
        self.inner.get_roles_in_domain(domain).await
    }

    async fn get_objects_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Object>> {
        self.inner.get_objects_in_domain(domain).await
    }

    async fn get_parents_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        self.inner.get_parents_for_role_in_domain(role, domain).await
    }

    async fn get_children_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Role>> {
        self.inner.get_children_for_role_in_domain(role, domain).await
    }

    async fn add_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("add_parent_for_role_in_domain");
        self.inner.add_parent_for_role_in_domain(role, parent, domain).await
    }

    async fn remove_parent_for_role_in_domain(
        &self,
        role: &Role,
        parent: &Role,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("remove_parent_for_role_in_domain");
        self.inner.remove_parent_for_role_in_domain(role, parent, domain).await
    }

    async fn get_parents_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>> {
        self.inner.get_parents_for_object_in_domain(object, domain).await
    }

    async fn get_children_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Object>> {
        self.inner.get_children_for_object_in_domain(object, domain).await
    }

    async fn add_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("add_parent_for_object_in_domain");
        self.inner.add_parent_for_object_in_domain(object, parent, domain).await
    }

    async fn remove_parent_for_object_in_domain(
        &self,
        object: &Object,
        parent: &Object,
        domain: &Domain,
    ) -> RbacResult<()> {
        self.record("remove_parent_for_object_in_domain");
        self.inner.remove_parent_for_object_in_domain(object, parent, domain).await
    }

    async fn get_policies_for_role_in_domain(
        &self,
        role: &Role,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>> {
        self.inner.get_policies_for_role_in_domain(role, domain).await
    }

    async fn get_policies_for_object_in_domain(
        &self,
        object: &Object,
        domain: &Domain,
    ) -> RbacResult<Vec<Policy>> {
        self.inner.get_policies_for_object_in_domain(object, domain).await
    }

    async fn get_policies_in_domain(&self, domain: &Domain) -> RbacResult<Vec<Policy>> {
        self.inner.get_policies_in_domain(domain).await
    }

    async fn add_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()> {
        self.record("add_policy_in_domain");
        self.inner.add_policy_in_domain(role, object, domain, action).await
    }

    async fn remove_policy_in_domain(
        &self,
        role: &Role,
        object: &Object,
        domain: &Domain,
        action: Action,
    ) -> RbacResult<()> {
        self.record("remove_policy_in_domain");
        self.inner.remove_policy_in_domain(role, object, domain, action).await
    }
}
