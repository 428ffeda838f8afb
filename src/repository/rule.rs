use chrono::Utc;
use diesel::prelude::*;

use crate::{
    domain::rule::{NewSupplierRule, SupplierRule},
    domain::rule_execution::{NewSupplierRuleExecution, SupplierRuleExecution},
    models::rule::{NewSupplierRule as DbNewRule, SupplierRule as DbRule},
    models::rule_execution::{
        NewSupplierRuleExecution as DbNewExecution, SupplierRuleExecution as DbExecution,
    },
    repository::{
        DieselRepository, RuleExecutionReader, RuleExecutionWriter, RuleReader, RuleWriter,
        errors::RepositoryResult,
    },
};

impl RuleReader for DieselRepository {
    fn list_active_rules(&self, supplier_id: i32) -> RepositoryResult<Vec<SupplierRule>> {
        use crate::schema::supplier_rules;

        let mut conn = self.conn()?;
        let db_rules = supplier_rules::table
            .filter(supplier_rules::supplier_id.eq(supplier_id))
            .filter(supplier_rules::is_active.eq(true))
            .order((
                supplier_rules::execution_order.asc(),
                supplier_rules::id.asc(),
            ))
            .load::<DbRule>(&mut conn)?;

        db_rules
            .into_iter()
            .map(|rule| rule.into_domain().map_err(Into::into))
            .collect()
    }
}

impl RuleWriter for DieselRepository {
    fn create_rule(&self, new_rule: &NewSupplierRule) -> RepositoryResult<SupplierRule> {
        use crate::schema::supplier_rules;

        let mut conn = self.conn()?;
        let db_new = DbNewRule::from_domain(new_rule)?;

        let created = diesel::insert_into(supplier_rules::table)
            .values(&db_new)
            .get_result::<DbRule>(&mut conn)?;

        Ok(created.into_domain()?)
    }
}

impl RuleExecutionReader for DieselRepository {
    fn list_executions(&self, upload_id: i32) -> RepositoryResult<Vec<SupplierRuleExecution>> {
        use crate::schema::supplier_rule_executions;

        let mut conn = self.conn()?;
        let db_executions = supplier_rule_executions::table
            .filter(supplier_rule_executions::upload_id.eq(upload_id))
            .order(supplier_rule_executions::id.asc())
            .load::<DbExecution>(&mut conn)?;

        db_executions
            .into_iter()
            .map(|execution| execution.into_domain().map_err(Into::into))
            .collect()
    }

    fn list_executions_after(
        &self,
        after_id: i32,
        supplier_id: Option<i32>,
        upload_id: Option<i32>,
        limit: i64,
    ) -> RepositoryResult<Vec<SupplierRuleExecution>> {
        use crate::schema::supplier_rule_executions;

        let mut conn = self.conn()?;

        let mut items = supplier_rule_executions::table
            .filter(supplier_rule_executions::id.gt(after_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(supplier_id) = supplier_id {
            items = items.filter(supplier_rule_executions::supplier_id.eq(supplier_id));
        }
        if let Some(upload_id) = upload_id {
            items = items.filter(supplier_rule_executions::upload_id.eq(upload_id));
        }

        let db_executions = items
            .order(supplier_rule_executions::id.asc())
            .limit(limit)
            .load::<DbExecution>(&mut conn)?;

        db_executions
            .into_iter()
            .map(|execution| execution.into_domain().map_err(Into::into))
            .collect()
    }
}

impl RuleExecutionWriter for DieselRepository {
    fn record_execution(
        &self,
        execution: &NewSupplierRuleExecution,
    ) -> RepositoryResult<SupplierRuleExecution> {
        use crate::schema::supplier_rule_executions;

        let mut conn = self.conn()?;
        let db_new = DbNewExecution::from_domain(execution, Utc::now().naive_utc())?;

        let created = diesel::insert_into(supplier_rule_executions::table)
            .values(&db_new)
            .get_result::<DbExecution>(&mut conn)?;

        Ok(created.into_domain()?)
    }
}
