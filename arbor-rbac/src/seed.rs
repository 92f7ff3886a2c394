//! Initial roles, objects and policies of a new domain

use crate::models::{Action, Domain, InDomain, Object, ObjectType, Policy, Role, ROOT_ID};

/// Entries seeded into one domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSeed {
    pub domain: Domain,
    pub roles: Vec<Role>,
    pub objects: Vec<Object>,
}

impl DomainSeed {
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }
}

/// Produces the seed of a domain.
///
/// Initialization runs `build`, stores the entries (assigning ids), runs
/// `relate`, stores them again and finally adds `policies`. Re-initializing
/// a domain runs every step again, so each one must be repeatable.
pub trait DomainCreator: Send + Sync {
    /// Roles and objects to create, without links between them
    fn build(&self, domain: &Domain) -> DomainSeed;

    /// Fill in parent and governing-object ids once every entry has an id
    fn relate(&self, seed: &mut DomainSeed);

    fn policies(&self, seed: &DomainSeed) -> Vec<Policy>;
}

pub const ROLE_ROOT: &str = "role_root";
pub const OBJECT_ROOT: &str = "object_root";
pub const ROLE_MEMBER: &str = "role_member";
pub const ADMIN: &str = "admin";
pub const MEMBER: &str = "member";

/// Two-role layout: `admin` manages everything, `member` reads objects
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDomainCreator;

impl DomainCreator for StandardDomainCreator {
    fn build(&self, domain: &Domain) -> DomainSeed {
        let mut objects = vec![
            Object::new(ROLE_ROOT, ObjectType::role(), ROOT_ID),
            Object::new(OBJECT_ROOT, ObjectType::object(), ROOT_ID),
            Object::new(ROLE_MEMBER, ObjectType::role(), ROOT_ID),
        ];
        let mut roles = vec![Role::new(ADMIN, 0, ROOT_ID), Role::new(MEMBER, 0, ROOT_ID)];

        objects.iter_mut().for_each(|o| o.set_domain_id(domain.id));
        roles.iter_mut().for_each(|r| r.set_domain_id(domain.id));

        DomainSeed {
            domain: domain.clone(),
            roles,
            objects,
        }
    }

    fn relate(&self, seed: &mut DomainSeed) {
        let id_of = |name: &str| seed.object(name).map_or(0, |o| o.id);
        let role_root = id_of(ROLE_ROOT);
        let role_member = id_of(ROLE_MEMBER);
        let admin = seed.role(ADMIN).map_or(0, |r| r.id);

        for object in seed.objects.iter_mut() {
            if object.name == ROLE_MEMBER {
                object.parent_id = role_root;
            }
        }
        for role in seed.roles.iter_mut() {
            match role.name.as_str() {
                ADMIN => role.object_id = role_root,
                MEMBER => {
                    role.object_id = role_member;
                    role.parent_id = admin;
                }
                _ => {}
            }
        }
    }

    fn policies(&self, seed: &DomainSeed) -> Vec<Policy> {
        let grant = |role: &str, object: &str, action: Action| {
            let role = seed.role(role)?.clone();
            let object = seed.object(object)?.clone();
            Some(Policy::new(role, object, seed.domain.clone(), action))
        };

        [
            grant(ADMIN, ROLE_ROOT, Action::Read),
            grant(ADMIN, ROLE_ROOT, Action::Write),
            grant(ADMIN, OBJECT_ROOT, Action::Read),
            grant(ADMIN, OBJECT_ROOT, Action::Write),
            grant(MEMBER, OBJECT_ROOT, Action::Read),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
