//! Persisted engine rule: one policy or grouping row

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "casbin_rule")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ptype: String,
    pub v0: Option<String>,
    pub v1: Option<String>,
    pub v2: Option<String>,
    pub v3: Option<String>,
    pub v4: Option<String>,
    pub v5: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rule values in column order, without trailing empty columns
    pub fn values(&self) -> Vec<String> {
        [&self.v0, &self.v1, &self.v2, &self.v3, &self.v4, &self.v5]
            .into_iter()
            .map_while(|v| v.clone())
            .collect()
    }
}

/// Column holding the rule value at `index`
pub fn value_column(index: usize) -> Option<Column> {
    match index {
        0 => Some(Column::V0),
        1 => Some(Column::V1),
        2 => Some(Column::V2),
        3 => Some(Column::V3),
        4 => Some(Column::V4),
        5 => Some(Column::V5),
        _ => None,
    }
}
