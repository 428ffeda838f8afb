use serde_json::json;

use crate::domain::audit::{AuditEvent, TimelineBatch, TimelineEvent, TimelineQuery, TimelineSource};
use crate::domain::rule_execution::SupplierRuleExecution;
use crate::repository::{AuditEventReader, RuleExecutionReader};
use crate::services::ServiceResult;

/// Events delivered per poll when the caller does not set a limit.
pub const DEFAULT_POLL_LIMIT: usize = 200;

/// One incremental poll over the unified pipeline timeline.
///
/// Audit events and rule executions are scanned separately from their own
/// cursors, merged by timestamp and truncated to the limit. The returned
/// cursors advance only past events actually delivered, so nothing is lost
/// between polls.
pub fn poll_events<R>(repo: &R, query: TimelineQuery) -> ServiceResult<TimelineBatch>
where
    R: AuditEventReader + RuleExecutionReader + ?Sized,
{
    let limit = query.limit.unwrap_or(DEFAULT_POLL_LIMIT);

    let audit_events = repo.list_audit_events_after(
        query.after_audit_id,
        query.supplier_id,
        query.upload_id,
        limit as i64,
    )?;
    let executions = repo.list_executions_after(
        query.after_rule_exec_id,
        query.supplier_id,
        query.upload_id,
        limit as i64,
    )?;

    let mut events: Vec<TimelineEvent> = audit_events
        .into_iter()
        .map(audit_to_event)
        .chain(executions.into_iter().map(execution_to_event))
        .collect();

    // Stable order: timestamp, then audit before rule executions, then id.
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.source.cmp(&b.source))
            .then(a.id.cmp(&b.id))
    });
    events.truncate(limit);

    let next_audit_cursor = events
        .iter()
        .filter(|event| event.source == TimelineSource::Audit)
        .map(|event| event.id)
        .max()
        .unwrap_or(query.after_audit_id);
    let next_rule_exec_cursor = events
        .iter()
        .filter(|event| event.source == TimelineSource::RuleExecution)
        .map(|event| event.id)
        .max()
        .unwrap_or(query.after_rule_exec_id);

    Ok(TimelineBatch {
        events,
        next_audit_cursor,
        next_rule_exec_cursor,
    })
}

fn audit_to_event(event: AuditEvent) -> TimelineEvent {
    TimelineEvent {
        source: TimelineSource::Audit,
        id: event.id,
        supplier_id: event.supplier_id,
        upload_id: event.upload_id,
        label: event.action,
        status: event.status,
        details: event.details,
        timestamp: event.started_at,
    }
}

fn execution_to_event(execution: SupplierRuleExecution) -> TimelineEvent {
    let status = if execution.blocked {
        "blocked"
    } else if execution.success {
        "passed"
    } else {
        "failed"
    };

    TimelineEvent {
        source: TimelineSource::RuleExecution,
        id: execution.id,
        supplier_id: Some(execution.supplier_id),
        upload_id: Some(execution.upload_id),
        label: execution.rule_name,
        status: status.to_string(),
        details: Some(json!({
            "rule_type": execution.rule_type,
            "rows_affected": execution.rows_affected,
            "execution_time_ms": execution.execution_time_ms,
            "warnings": execution.warnings,
        })),
        timestamp: execution.executed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::repository::errors::RepositoryResult;
    use crate::repository::mock::{MockAuditEventReader, MockRuleExecutionReader};

    struct FakeRepo {
        audit: MockAuditEventReader,
        executions: MockRuleExecutionReader,
    }

    impl AuditEventReader for FakeRepo {
        fn list_audit_events_after(
            &self,
            after_id: i32,
            supplier_id: Option<i32>,
            upload_id: Option<i32>,
            limit: i64,
        ) -> RepositoryResult<Vec<AuditEvent>> {
            self.audit
                .list_audit_events_after(after_id, supplier_id, upload_id, limit)
        }
        fn last_audit_event(&self, upload_id: i32) -> RepositoryResult<Option<AuditEvent>> {
            self.audit.last_audit_event(upload_id)
        }
    }

    impl RuleExecutionReader for FakeRepo {
        fn list_executions(
            &self,
            upload_id: i32,
        ) -> RepositoryResult<Vec<SupplierRuleExecution>> {
            self.executions.list_executions(upload_id)
        }
        fn list_executions_after(
            &self,
            after_id: i32,
            supplier_id: Option<i32>,
            upload_id: Option<i32>,
            limit: i64,
        ) -> RepositoryResult<Vec<SupplierRuleExecution>> {
            self.executions
                .list_executions_after(after_id, supplier_id, upload_id, limit)
        }
    }

    fn at(seconds: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, seconds))
            .unwrap_or_default()
    }

    fn audit_event(id: i32, seconds: u32) -> AuditEvent {
        AuditEvent {
            id,
            supplier_id: Some(1),
            upload_id: Some(5),
            action: "validation_finished".to_string(),
            status: "completed".to_string(),
            details: None,
            started_at: at(seconds),
            finished_at: Some(at(seconds)),
        }
    }

    fn execution(id: i32, seconds: u32, blocked: bool) -> SupplierRuleExecution {
        SupplierRuleExecution {
            id,
            rule_id: 1,
            upload_id: 5,
            supplier_id: 1,
            rule_name: "floor".to_string(),
            rule_type: "min_price".to_string(),
            execution_order: 1,
            trigger_event: crate::PIPELINE_TRIGGER_EVENT.to_string(),
            executed_at: at(seconds),
            success: true,
            blocked,
            input_snapshot: Vec::new(),
            output_snapshot: Vec::new(),
            warnings: Vec::new(),
            rows_affected: 2,
            execution_time_ms: 3,
        }
    }

    #[test]
    fn merges_both_sources_in_timestamp_order() {
        let mut audit = MockAuditEventReader::new();
        audit
            .expect_list_audit_events_after()
            .returning(|_, _, _, _| Ok(vec![audit_event(1, 10), audit_event(2, 30)]));
        let mut executions = MockRuleExecutionReader::new();
        executions
            .expect_list_executions_after()
            .returning(|_, _, _, _| Ok(vec![execution(1, 20, true)]));
        let repo = FakeRepo { audit, executions };

        let batch = poll_events(&repo, TimelineQuery::new(0, 0)).expect("batch");

        let labels: Vec<&str> = batch.events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["validation_finished", "floor", "validation_finished"]);
        assert_eq!(batch.events[1].status, "blocked");
        assert_eq!(batch.next_audit_cursor, 2);
        assert_eq!(batch.next_rule_exec_cursor, 1);
    }

    #[test]
    fn ties_put_audit_events_first() {
        let mut audit = MockAuditEventReader::new();
        audit
            .expect_list_audit_events_after()
            .returning(|_, _, _, _| Ok(vec![audit_event(1, 10)]));
        let mut executions = MockRuleExecutionReader::new();
        executions
            .expect_list_executions_after()
            .returning(|_, _, _, _| Ok(vec![execution(1, 10, false)]));
        let repo = FakeRepo { audit, executions };

        let batch = poll_events(&repo, TimelineQuery::new(0, 0)).expect("batch");

        assert_eq!(batch.events[0].source, TimelineSource::Audit);
        assert_eq!(batch.events[1].source, TimelineSource::RuleExecution);
    }

    #[test]
    fn truncation_advances_cursors_only_past_delivered_events() {
        let mut audit = MockAuditEventReader::new();
        audit
            .expect_list_audit_events_after()
            .returning(|_, _, _, _| Ok(vec![audit_event(1, 10), audit_event(2, 40)]));
        let mut executions = MockRuleExecutionReader::new();
        executions
            .expect_list_executions_after()
            .returning(|_, _, _, _| Ok(vec![execution(3, 20, false), execution(4, 30, false)]));
        let repo = FakeRepo { audit, executions };

        let batch = poll_events(&repo, TimelineQuery::new(0, 0).limit(2)).expect("batch");

        // Only the first two events by time made the cut.
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.next_audit_cursor, 1);
        assert_eq!(batch.next_rule_exec_cursor, 3);

        let resumed = TimelineQuery::new(batch.next_audit_cursor, batch.next_rule_exec_cursor);
        assert_eq!(resumed.after_audit_id, 1);
        assert_eq!(resumed.after_rule_exec_id, 3);
    }

    #[test]
    fn empty_poll_echoes_the_cursors_back() {
        let mut audit = MockAuditEventReader::new();
        audit
            .expect_list_audit_events_after()
            .returning(|_, _, _, _| Ok(Vec::new()));
        let mut executions = MockRuleExecutionReader::new();
        executions
            .expect_list_executions_after()
            .returning(|_, _, _, _| Ok(Vec::new()));
        let repo = FakeRepo { audit, executions };

        let batch = poll_events(&repo, TimelineQuery::new(17, 42)).expect("batch");

        assert!(batch.events.is_empty());
        assert_eq!(batch.next_audit_cursor, 17);
        assert_eq!(batch.next_rule_exec_cursor, 42);
    }
}
