//! Data models for the authorization layer
//!
//! Users, roles, objects and domains are closed entry kinds. Each one
//! composes the capability traits it needs:
//!
//! - [`Entry`]: identity, natural key and the string form used by the engine
//! - [`ParentEntry`]: a single parent link (roles and objects)
//! - [`InDomain`]: scoping to exactly one domain (roles and objects)
//! - [`ObjectData`]: the object whose grants govern the value

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RbacError, RbacResult};

/// Sentinel parent identity of a root entry
pub const ROOT_ID: u64 = 0;

/// The closed set of entry kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    User,
    Role,
    Object,
    Domain,
}

impl EntryKind {
    /// Prefix used in the engine's string encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::User => "user",
            EntryKind::Role => "role",
            EntryKind::Object => "object",
            EntryKind::Domain => "domain",
        }
    }
}

/// Identity-bearing, encodable record
pub trait Entry: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: EntryKind;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    /// Key that identifies the entry independently of its id
    fn natural_key(&self) -> String;

    /// Encode to the engine representation, e.g. `role_3`
    fn encode(&self) -> String {
        format!("{}_{}", Self::KIND.as_str(), self.id())
    }

    /// Decode an engine representation into this entry's id
    fn decode(&mut self, encoded: &str) -> RbacResult<()> {
        let id = encoded
            .strip_prefix(Self::KIND.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|id| id.parse::<u64>().ok())
            .filter(|id| *id != 0)
            .ok_or_else(|| RbacError::decode(encoded))?;
        self.set_id(id);
        Ok(())
    }

    fn is_object(&self) -> bool {
        Self::KIND == EntryKind::Object
    }
}

/// Entry with a single parent link
pub trait ParentEntry: Entry {
    fn parent_id(&self) -> u64;

    fn set_parent_id(&mut self, parent_id: u64);

    fn is_root(&self) -> bool {
        self.parent_id() == ROOT_ID
    }
}

/// Entry scoped to one domain
pub trait InDomain {
    fn domain_id(&self) -> u64;

    fn set_domain_id(&mut self, domain_id: u64);
}

/// Value whose access is governed by the grants on an object
pub trait ObjectData: Send + Sync {
    fn object_id(&self) -> u64;
}

/// Classification of a protected object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectType(String);

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Objects governing roles
    pub fn role() -> Self {
        Self::new("role")
    }

    /// Objects governing other objects
    pub fn object() -> Self {
        Self::new("object")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Policy action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

impl FromStr for Action {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            _ => Err(RbacError::decode(s)),
        }
    }
}

/// Principal; domain membership is expressed through role assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Entry for User {
    const KIND: EntryKind = EntryKind::User;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn natural_key(&self) -> String {
        self.email.clone()
    }
}

/// Tenant boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    pub name: String,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl Entry for Domain {
    const KIND: EntryKind = EntryKind::Domain;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

/// Node of a domain's role tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
    pub parent_id: u64,
    pub domain_id: u64,
    /// Object of type `role` whose grants govern this role
    pub object_id: u64,
}

impl Role {
    pub fn new(name: impl Into<String>, object_id: u64, parent_id: u64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            parent_id,
            domain_id: 0,
            object_id,
        }
    }
}

impl Entry for Role {
    const KIND: EntryKind = EntryKind::Role;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn natural_key(&self) -> String {
        format!("{}:{}", self.domain_id, self.name)
    }
}

impl ParentEntry for Role {
    fn parent_id(&self) -> u64 {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent_id: u64) {
        self.parent_id = parent_id;
    }
}

impl InDomain for Role {
    fn domain_id(&self) -> u64 {
        self.domain_id
    }

    fn set_domain_id(&mut self, domain_id: u64) {
        self.domain_id = domain_id;
    }
}

impl ObjectData for Role {
    fn object_id(&self) -> u64 {
        self.object_id
    }
}

/// Node of a domain's object tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: u64,
    pub name: String,
    pub object_type: ObjectType,
    pub parent_id: u64,
    pub domain_id: u64,
}

impl Object {
    pub fn new(name: impl Into<String>, object_type: ObjectType, parent_id: u64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            object_type,
            parent_id,
            domain_id: 0,
        }
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }
}

impl Entry for Object {
    const KIND: EntryKind = EntryKind::Object;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn natural_key(&self) -> String {
        format!("{}:{}:{}", self.domain_id, self.object_type, self.name)
    }
}

impl ParentEntry for Object {
    fn parent_id(&self) -> u64 {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent_id: u64) {
        self.parent_id = parent_id;
    }
}

impl InDomain for Object {
    fn domain_id(&self) -> u64 {
        self.domain_id
    }

    fn set_domain_id(&mut self, domain_id: u64) {
        self.domain_id = domain_id;
    }
}

// An object is governed by its own grants.
impl ObjectData for Object {
    fn object_id(&self) -> u64 {
        self.id
    }
}

/// Produces empty typed entries, used for lookup templates and decoding
pub trait EntryFactory: Send + Sync {
    fn new_user(&self) -> User;

    fn new_role(&self) -> Role;

    fn new_object(&self) -> Object;

    fn new_domain(&self) -> Domain;
}

/// Factory returning `Default` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntryFactory;

impl EntryFactory for DefaultEntryFactory {
    fn new_user(&self) -> User {
        User::default()
    }

    fn new_role(&self) -> Role {
        Role::default()
    }

    fn new_object(&self) -> Object {
        Object::default()
    }

    fn new_domain(&self) -> Domain {
        Domain::default()
    }
}

/// Role to object grant within a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub role: Role,
    pub object: Object,
    pub domain: Domain,
    pub action: Action,
}

/// Identity of a policy: the full (role, object, domain, action) tuple
pub type PolicyKey = (u64, u64, u64, Action);

impl Policy {
    pub fn new(role: Role, object: Object, domain: Domain, action: Action) -> Self {
        Self {
            role,
            object,
            domain,
            action,
        }
    }

    pub fn key(&self) -> PolicyKey {
        (self.role.id, self.object.id, self.domain.id, self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesForUser {
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersForRole {
    pub role: Role,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliciesForRole {
    pub role: Role,
    pub policies: Vec<Policy>,
}

/// One membership edge between a user and a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRolePair {
    pub user: User,
    pub role: Role,
}

impl UserRolePair {
    pub fn new(user: User, role: Role) -> Self {
        Self { user, role }
    }
}
