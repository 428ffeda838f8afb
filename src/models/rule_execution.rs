use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::rule_execution::{
    NewSupplierRuleExecution as DomainNewExecution, RowSnapshot,
    SupplierRuleExecution as DomainExecution,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::supplier_rule_executions)]
pub struct SupplierRuleExecution {
    pub id: i32,
    pub rule_id: i32,
    pub upload_id: i32,
    pub supplier_id: i32,
    pub rule_name: String,
    pub rule_type: String,
    pub execution_order: i32,
    pub trigger_event: String,
    pub executed_at: NaiveDateTime,
    pub success: bool,
    pub blocked: bool,
    pub input_snapshot: Option<String>,
    pub output_snapshot: Option<String>,
    pub warnings: Option<String>,
    pub rows_affected: i32,
    pub execution_time_ms: i64,
}

impl SupplierRuleExecution {
    pub fn into_domain(self) -> Result<DomainExecution, serde_json::Error> {
        Ok(DomainExecution {
            id: self.id,
            rule_id: self.rule_id,
            upload_id: self.upload_id,
            supplier_id: self.supplier_id,
            rule_name: self.rule_name,
            rule_type: self.rule_type,
            execution_order: self.execution_order,
            trigger_event: self.trigger_event,
            executed_at: self.executed_at,
            success: self.success,
            blocked: self.blocked,
            input_snapshot: parse_snapshots(self.input_snapshot.as_deref())?,
            output_snapshot: parse_snapshots(self.output_snapshot.as_deref())?,
            warnings: parse_warnings(self.warnings.as_deref())?,
            rows_affected: self.rows_affected,
            execution_time_ms: self.execution_time_ms,
        })
    }
}

fn parse_snapshots(text: Option<&str>) -> Result<Vec<RowSnapshot>, serde_json::Error> {
    Ok(text.map(serde_json::from_str).transpose()?.unwrap_or_default())
}

fn parse_warnings(text: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    Ok(text.map(serde_json::from_str).transpose()?.unwrap_or_default())
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::supplier_rule_executions)]
pub struct NewSupplierRuleExecution<'a> {
    pub rule_id: i32,
    pub upload_id: i32,
    pub supplier_id: i32,
    pub rule_name: &'a str,
    pub rule_type: &'a str,
    pub execution_order: i32,
    pub trigger_event: &'a str,
    pub executed_at: NaiveDateTime,
    pub success: bool,
    pub blocked: bool,
    pub input_snapshot: Option<String>,
    pub output_snapshot: Option<String>,
    pub warnings: Option<String>,
    pub rows_affected: i32,
    pub execution_time_ms: i64,
}

impl<'a> NewSupplierRuleExecution<'a> {
    pub fn from_domain(
        execution: &'a DomainNewExecution,
        executed_at: NaiveDateTime,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            rule_id: execution.rule_id,
            upload_id: execution.upload_id,
            supplier_id: execution.supplier_id,
            rule_name: execution.rule_name.as_str(),
            rule_type: execution.rule_type.as_str(),
            execution_order: execution.execution_order,
            trigger_event: execution.trigger_event.as_str(),
            executed_at,
            success: execution.success,
            blocked: execution.blocked,
            input_snapshot: Some(serde_json::to_string(&execution.input_snapshot)?),
            output_snapshot: Some(serde_json::to_string(&execution.output_snapshot)?),
            warnings: Some(serde_json::to_string(&execution.warnings)?),
            rows_affected: execution.rows_affected,
            execution_time_ms: execution.execution_time_ms,
        })
    }
}
