//! SeaORM entities

pub mod casbin_rule;

pub use casbin_rule::{
    ActiveModel as CasbinRuleActiveModel, Column as CasbinRuleColumn, Entity as CasbinRules,
    Model as CasbinRule,
};
