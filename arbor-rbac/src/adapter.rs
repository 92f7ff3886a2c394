//! SeaORM adapter for Casbin policy storage

use casbin::{error::AdapterError, Adapter, Filter, Model, Result as CasbinResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Schema, Set,
};

use crate::entities::casbin_rule::{self, value_column};
use crate::entities::{CasbinRuleActiveModel, CasbinRuleColumn, CasbinRules};
use crate::error::RbacResult;

/// Casbin adapter persisting rules in the `casbin_rule` table
#[derive(Clone)]
pub struct SeaOrmAdapter {
    db: DatabaseConnection,
    is_filtered: bool,
}

impl SeaOrmAdapter {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            is_filtered: false,
        }
    }

    /// Create the rule table if it does not exist yet
    pub async fn create_table(&self) -> RbacResult<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(CasbinRules);
        stmt.if_not_exists();

        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn load_rules(&self) -> RbacResult<Vec<casbin_rule::Model>> {
        Ok(CasbinRules::find().all(&self.db).await?)
    }

    async fn insert_rule(&self, ptype: &str, rule: &[String]) -> RbacResult<()> {
        let value = |i: usize| rule.get(i).cloned();
        let row = CasbinRuleActiveModel {
            ptype: Set(ptype.to_string()),
            v0: Set(value(0)),
            v1: Set(value(1)),
            v2: Set(value(2)),
            v3: Set(value(3)),
            v4: Set(value(4)),
            v5: Set(value(5)),
            ..Default::default()
        };

        CasbinRules::insert(row).exec(&self.db).await?;
        Ok(())
    }

    async fn delete_rule(&self, ptype: &str, rule: &[String]) -> RbacResult<bool> {
        self.delete_matching(ptype, 0, rule).await
    }

    /// Delete rows of `ptype` whose values starting at `field_index` match.
    /// Empty values match anything.
    async fn delete_matching(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> RbacResult<bool> {
        let mut query = CasbinRules::delete_many().filter(CasbinRuleColumn::Ptype.eq(ptype));

        for (offset, value) in field_values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value_column(field_index + offset) {
                Some(column) => query = query.filter(column.eq(value.clone())),
                None => break,
            }
        }

        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn clear(&self) -> RbacResult<()> {
        CasbinRules::delete_many().exec(&self.db).await?;
        Ok(())
    }
}

fn section_of(ptype: &str) -> &'static str {
    if ptype.starts_with('g') {
        "g"
    } else {
        "p"
    }
}

fn matches_filter(values: &[String], filter: &[&str]) -> bool {
    filter.iter().enumerate().all(|(i, expected)| {
        expected.is_empty() || values.get(i).map(String::as_str) == Some(*expected)
    })
}

#[async_trait::async_trait]
impl Adapter for SeaOrmAdapter {
    async fn load_policy(&mut self, model: &mut dyn Model) -> CasbinResult<()> {
        let rules = self.load_rules().await.map_err(|e| AdapterError(Box::new(e)))?;

        for rule in rules {
            let values = rule.values();
            if values.is_empty() {
                continue;
            }
            model.add_policy(section_of(&rule.ptype), &rule.ptype, values);
        }

        self.is_filtered = false;
        Ok(())
    }

    async fn load_filtered_policy<'a>(
        &mut self,
        model: &mut dyn Model,
        filter: Filter<'a>,
    ) -> CasbinResult<()> {
        let rules = self.load_rules().await.map_err(|e| AdapterError(Box::new(e)))?;

        for rule in rules {
            let values = rule.values();
            if values.is_empty() {
                continue;
            }
            let sec = section_of(&rule.ptype);
            let wanted = if sec == "g" { &filter.g } else { &filter.p };
            if matches_filter(&values, wanted) {
                model.add_policy(sec, &rule.ptype, values);
            }
        }

        self.is_filtered = true;
        Ok(())
    }

    async fn save_policy(&mut self, model: &mut dyn Model) -> CasbinResult<()> {
        self.clear().await.map_err(|e| AdapterError(Box::new(e)))?;

        for sec in ["p", "g"] {
            let Some(ast_map) = model.get_model().get(sec) else {
                continue;
            };
            for (ptype, ast) in ast_map {
                for rule in ast.get_policy() {
                    self.insert_rule(ptype, rule)
                        .await
                        .map_err(|e| AdapterError(Box::new(e)))?;
                }
            }
        }

        Ok(())
    }

    async fn clear_policy(&mut self) -> CasbinResult<()> {
        self.clear().await.map_err(|e| AdapterError(Box::new(e)))?;
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        self.is_filtered
    }

    async fn add_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> CasbinResult<bool> {
        self.insert_rule(ptype, &rule)
            .await
            .map_err(|e| AdapterError(Box::new(e)))?;
        Ok(true)
    }

    async fn add_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> CasbinResult<bool> {
        for rule in rules {
            self.insert_rule(ptype, &rule)
                .await
                .map_err(|e| AdapterError(Box::new(e)))?;
        }
        Ok(true)
    }

    async fn remove_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> CasbinResult<bool> {
        let removed = self
            .delete_rule(ptype, &rule)
            .await
            .map_err(|e| AdapterError(Box::new(e)))?;
        Ok(removed)
    }

    async fn remove_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> CasbinResult<bool> {
        let mut removed = false;
        for rule in rules {
            removed |= self
                .delete_rule(ptype, &rule)
                .await
                .map_err(|e| AdapterError(Box::new(e)))?;
        }
        Ok(removed)
    }

    async fn remove_filtered_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: Vec<String>,
    ) -> CasbinResult<bool> {
        let removed = self
            .delete_matching(ptype, field_index, &field_values)
            .await
            .map_err(|e| AdapterError(Box::new(e)))?;
        Ok(removed)
    }
}
