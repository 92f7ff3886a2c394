//! Multi-tenant, hierarchy-aware access control on top of Casbin
//!
//! This crate provides domain-scoped role-based access control with support for:
//! - Users, roles, objects and domains kept in a metadata store
//! - Role and object trees mirrored into the Casbin engine
//! - Read/write policies from roles to objects, inherited along both trees
//! - Superadmin bootstrap and root-entry protection
//! - Permission-filtered reads and minimal-diff synchronization of
//!   memberships and policies
//!
//! [`Arbor`] owns the collaborators; [`Executor`] runs the workflows for
//! whichever user and domain its [`CurrentProvider`] reports.

pub mod adapter;
pub mod arbor;
pub mod config;
pub mod context;
pub mod diff;
pub mod enforcer;
pub mod engine;
pub mod entities;
pub mod error;
pub mod executor;
pub mod logging;
pub mod model;
pub mod models;
pub mod permissions;
pub mod seed;
pub mod store;
pub mod tree;
pub mod validation;

pub use adapter::SeaOrmAdapter;
pub use arbor::{Arbor, ArborOptions};
pub use config::{ConfigLoader, RbacConfig};
pub use context::{CachedProvider, CurrentProvider, StaticProvider};
pub use diff::{diff, diff_policy};
pub use enforcer::RbacEnforcer;
pub use engine::EnforcementEngine;
pub use error::{RbacError, RbacResult};
pub use executor::Executor;
pub use model::ModelCache;
pub use models::{
    Action, DefaultEntryFactory, Domain, Entry, EntryFactory, Object, ObjectData, ObjectType,
    ParentEntry, PoliciesForRole, Policy, Role, RolesForUser, User, UserRolePair, UsersForRole,
    ROOT_ID,
};
pub use permissions::PermissionChecker;
pub use seed::{DomainCreator, DomainSeed, StandardDomainCreator};
pub use store::{EntityStore, MemoryStore, MetadataStore, Presence};

/// Re-export commonly used types
pub use casbin::{Enforcer, MemoryAdapter, Result as CasbinResult};
