use chrono::Utc;
use diesel::prelude::*;

use crate::{
    domain::audit::{AuditEvent, NewAuditEvent},
    models::audit::{AuditEvent as DbAuditEvent, NewAuditEvent as DbNewAuditEvent},
    repository::{AuditEventReader, DieselRepository, EventRecorder, errors::RepositoryResult},
};

impl EventRecorder for DieselRepository {
    fn record_event(&self, event: &NewAuditEvent) -> RepositoryResult<AuditEvent> {
        use crate::schema::audit_events;

        let mut conn = self.conn()?;
        let db_new = DbNewAuditEvent::from_domain(event, Utc::now().naive_utc())?;

        let created = diesel::insert_into(audit_events::table)
            .values(&db_new)
            .get_result::<DbAuditEvent>(&mut conn)?;

        Ok(created.into_domain()?)
    }
}

impl AuditEventReader for DieselRepository {
    fn list_audit_events_after(
        &self,
        after_id: i32,
        supplier_id: Option<i32>,
        upload_id: Option<i32>,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditEvent>> {
        use crate::schema::audit_events;

        let mut conn = self.conn()?;

        let mut items = audit_events::table
            .filter(audit_events::id.gt(after_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(supplier_id) = supplier_id {
            items = items.filter(audit_events::supplier_id.eq(supplier_id));
        }
        if let Some(upload_id) = upload_id {
            items = items.filter(audit_events::upload_id.eq(upload_id));
        }

        let db_events = items
            .order(audit_events::id.asc())
            .limit(limit)
            .load::<DbAuditEvent>(&mut conn)?;

        db_events
            .into_iter()
            .map(|event| event.into_domain().map_err(Into::into))
            .collect()
    }

    fn last_audit_event(&self, upload_id: i32) -> RepositoryResult<Option<AuditEvent>> {
        use crate::schema::audit_events;

        let mut conn = self.conn()?;
        let event = audit_events::table
            .filter(audit_events::upload_id.eq(upload_id))
            .order(audit_events::id.desc())
            .first::<DbAuditEvent>(&mut conn)
            .optional()?;

        event.map(|event| event.into_domain().map_err(Into::into)).transpose()
    }
}
