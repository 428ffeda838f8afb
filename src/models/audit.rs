use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::audit::{AuditEvent as DomainAuditEvent, NewAuditEvent as DomainNewAuditEvent};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::audit_events)]
pub struct AuditEvent {
    pub id: i32,
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    pub action: String,
    pub status: String,
    pub details: Option<String>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

impl AuditEvent {
    pub fn into_domain(self) -> Result<DomainAuditEvent, serde_json::Error> {
        let details = self
            .details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(DomainAuditEvent {
            id: self.id,
            supplier_id: self.supplier_id,
            upload_id: self.upload_id,
            action: self.action,
            status: self.status,
            details,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::audit_events)]
pub struct NewAuditEvent<'a> {
    pub supplier_id: Option<i32>,
    pub upload_id: Option<i32>,
    pub action: &'a str,
    pub status: &'a str,
    pub details: Option<String>,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
}

impl<'a> NewAuditEvent<'a> {
    pub fn from_domain(
        event: &'a DomainNewAuditEvent,
        now: NaiveDateTime,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            supplier_id: event.supplier_id,
            upload_id: event.upload_id,
            action: event.action.as_str(),
            status: event.status.as_str(),
            details: event
                .details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            started_at: now,
            finished_at: event.finished.then_some(now),
        })
    }
}
