use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// General-purpose audit record appended by every pipeline phase.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub id: i32,
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    /// What happened, e.g. `upload_received` or `merge_finished`.
    pub action: String,
    /// Outcome label, e.g. `completed` or `failed`.
    pub status: String,
    pub details: Option<Value>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

/// Payload for appending one audit event.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    pub action: String,
    pub status: String,
    pub details: Option<Value>,
    pub finished: bool,
}

impl NewAuditEvent {
    pub fn new(action: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            supplier_id: None,
            upload_id: None,
            action: action.into(),
            status: status.into(),
            details: None,
            finished: true,
        }
    }

    pub fn supplier(mut self, supplier_id: i32) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn upload(mut self, upload_id: i32) -> Self {
        self.upload_id = Some(upload_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Leave the event open; `finished_at` stays null until a later update.
    pub fn open(mut self) -> Self {
        self.finished = false;
        self
    }
}

/// Which log a timeline event came from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TimelineSource {
    Audit,
    RuleExecution,
}

/// One entry of the unified, time-ordered pipeline timeline.
#[derive(Debug, Serialize, Clone)]
pub struct TimelineEvent {
    pub source: TimelineSource,
    /// Id within the source log; cursors are per source.
    pub id: i32,
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    pub label: String,
    pub status: String,
    pub details: Option<Value>,
    pub timestamp: NaiveDateTime,
}

/// Cursor-based query over the merged timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    /// Only audit events with id greater than this are returned.
    pub after_audit_id: i32,
    /// Only rule executions with id greater than this are returned.
    pub after_rule_exec_id: i32,
    pub limit: Option<usize>,
}

impl TimelineQuery {
    pub fn new(after_audit_id: i32, after_rule_exec_id: i32) -> Self {
        Self {
            after_audit_id,
            after_rule_exec_id,
            ..Default::default()
        }
    }

    pub fn supplier(mut self, supplier_id: i32) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn upload(mut self, upload_id: i32) -> Self {
        self.upload_id = Some(upload_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One poll's worth of merged events plus the cursors to resume from.
#[derive(Debug, Serialize, Clone)]
pub struct TimelineBatch {
    pub events: Vec<TimelineEvent>,
    /// Highest audit event id delivered, or the requested cursor if none.
    pub next_audit_cursor: i32,
    /// Highest rule execution id delivered, or the requested cursor if none.
    pub next_rule_exec_cursor: i32,
}
