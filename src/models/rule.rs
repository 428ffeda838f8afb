use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::rule::{
    NewSupplierRule as DomainNewRule, RuleConfig, SupplierRule as DomainRule,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::supplier_rules)]
pub struct SupplierRule {
    pub id: i32,
    pub supplier_id: i32,
    pub rule_name: String,
    pub rule_type: String,
    pub config: String,
    pub execution_order: i32,
    pub fail_closed: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl SupplierRule {
    /// Fallible because `config` must parse back into a known rule shape.
    pub fn into_domain(self) -> Result<DomainRule, serde_json::Error> {
        let config: RuleConfig = serde_json::from_str(&self.config)?;
        Ok(DomainRule {
            id: self.id,
            supplier_id: self.supplier_id,
            rule_name: self.rule_name,
            config,
            execution_order: self.execution_order,
            fail_closed: self.fail_closed,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::supplier_rules)]
pub struct NewSupplierRule<'a> {
    pub supplier_id: i32,
    pub rule_name: &'a str,
    pub rule_type: &'a str,
    pub config: String,
    pub execution_order: i32,
    pub fail_closed: bool,
    pub is_active: bool,
}

impl<'a> NewSupplierRule<'a> {
    pub fn from_domain(rule: &'a DomainNewRule) -> Result<Self, serde_json::Error> {
        Ok(Self {
            supplier_id: rule.supplier_id,
            rule_name: rule.rule_name.as_str(),
            rule_type: rule.config.rule_type(),
            config: serde_json::to_string(&rule.config)?,
            execution_order: rule.execution_order,
            fail_closed: rule.fail_closed,
            is_active: rule.is_active,
        })
    }
}
