use chrono::Utc;
use diesel::prelude::*;

use crate::{
    domain::row::{NewPricelistRow, PricelistRow, RowUpdate, RowValidity},
    domain::upload::{NewPricelistUpload, PricelistUpload, UploadListQuery, UploadStatus},
    models::row::{
        NewPricelistRow as DbNewRow, PricelistRow as DbRow, serialize_attrs,
    },
    models::upload::{NewPricelistUpload as DbNewUpload, PricelistUpload as DbUpload},
    repository::{
        DieselRepository, RowReader, RowWriter, UploadReader, UploadWriter,
        errors::{RepositoryError, RepositoryResult},
    },
};

impl UploadReader for DieselRepository {
    fn get_upload_by_id(&self, id: i32) -> RepositoryResult<Option<PricelistUpload>> {
        use crate::schema::pricelist_uploads;

        let mut conn = self.conn()?;
        let upload = pricelist_uploads::table
            .find(id)
            .first::<DbUpload>(&mut conn)
            .optional()?;

        Ok(upload.map(Into::into))
    }

    fn list_uploads(
        &self,
        query: UploadListQuery,
    ) -> RepositoryResult<(usize, Vec<PricelistUpload>)> {
        use crate::schema::pricelist_uploads;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = pricelist_uploads::table.into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(supplier_id) = query.supplier_id {
                items = items.filter(pricelist_uploads::supplier_id.eq(supplier_id));
            }
            if let Some(status) = query.status {
                items = items.filter(pricelist_uploads::status.eq(status.as_str()));
            }
            items
        };

        // Get the total count before applying pagination
        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        // Newest uploads first
        let db_uploads = items
            .order(pricelist_uploads::id.desc())
            .load::<DbUpload>(&mut conn)?;

        Ok((total, db_uploads.into_iter().map(Into::into).collect()))
    }
}

impl UploadWriter for DieselRepository {
    fn create_upload(
        &self,
        new_upload: &NewPricelistUpload,
        rows: &[NewPricelistRow],
    ) -> RepositoryResult<PricelistUpload> {
        use crate::schema::{pricelist_rows, pricelist_uploads};

        let mut conn = self.conn()?;

        let created = conn.transaction::<DbUpload, RepositoryError, _>(|conn| {
            let db_new: DbNewUpload = new_upload.into();
            let upload = diesel::insert_into(pricelist_uploads::table)
                .values(&db_new)
                .get_result::<DbUpload>(conn)?;

            for row in rows {
                let db_row = DbNewRow::from_domain(upload.id, row)?;
                diesel::insert_into(pricelist_rows::table)
                    .values(&db_row)
                    .execute(conn)?;
            }

            let upload = diesel::update(pricelist_uploads::table.find(upload.id))
                .set((
                    pricelist_uploads::row_count.eq(rows.len() as i32),
                    pricelist_uploads::updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<DbUpload>(conn)?;

            Ok(upload)
        })?;

        Ok(created.into())
    }

    fn set_upload_status(
        &self,
        upload_id: i32,
        from: UploadStatus,
        to: UploadStatus,
    ) -> RepositoryResult<PricelistUpload> {
        use crate::schema::pricelist_uploads;

        if !from.can_transition(to) {
            return Err(RepositoryError::Conflict(format!(
                "illegal status transition {} -> {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let mut conn = self.conn()?;

        // Compare-and-set so a concurrent writer cannot be overwritten.
        let target = pricelist_uploads::table
            .filter(pricelist_uploads::id.eq(upload_id))
            .filter(pricelist_uploads::status.eq(from.as_str()));

        let updated = diesel::update(target)
            .set((
                pricelist_uploads::status.eq(to.as_str()),
                pricelist_uploads::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<DbUpload>(&mut conn)
            .optional()?;

        match updated {
            Some(upload) => Ok(upload.into()),
            None => {
                let current = pricelist_uploads::table
                    .find(upload_id)
                    .first::<DbUpload>(&mut conn)
                    .optional()?;
                match current {
                    None => Err(RepositoryError::NotFound),
                    Some(upload) => Err(RepositoryError::Conflict(format!(
                        "upload {} is {}, expected {}",
                        upload_id, upload.status, from.as_str()
                    ))),
                }
            }
        }
    }
}

impl RowReader for DieselRepository {
    fn list_rows(&self, upload_id: i32) -> RepositoryResult<Vec<PricelistRow>> {
        use crate::schema::pricelist_rows;

        let mut conn = self.conn()?;
        let db_rows = pricelist_rows::table
            .filter(pricelist_rows::upload_id.eq(upload_id))
            .order(pricelist_rows::row_num.asc())
            .load::<DbRow>(&mut conn)?;

        db_rows
            .into_iter()
            .map(|row| row.into_domain().map_err(Into::into))
            .collect()
    }
}

impl RowWriter for DieselRepository {
    fn set_row_validity(
        &self,
        upload_id: i32,
        verdicts: &[RowValidity],
    ) -> RepositoryResult<usize> {
        use crate::schema::pricelist_rows;

        let mut conn = self.conn()?;

        conn.transaction::<usize, RepositoryError, _>(|conn| {
            let mut count_updated: usize = 0;

            for verdict in verdicts {
                let target = pricelist_rows::table
                    .filter(pricelist_rows::upload_id.eq(upload_id))
                    .filter(pricelist_rows::row_num.eq(verdict.row_num));

                count_updated += diesel::update(target)
                    .set((
                        pricelist_rows::valid.eq(verdict.valid),
                        pricelist_rows::invalid_reason.eq(verdict.reason.as_deref()),
                    ))
                    .execute(conn)?;
            }

            Ok(count_updated)
        })
    }

    fn apply_rule_outcomes(
        &self,
        upload_id: i32,
        updates: &[RowUpdate],
    ) -> RepositoryResult<usize> {
        use crate::schema::pricelist_rows;

        let mut conn = self.conn()?;

        conn.transaction::<usize, RepositoryError, _>(|conn| {
            let mut count_updated: usize = 0;

            for update in updates {
                let attrs_json = serialize_attrs(update.attrs.as_ref())?;
                let target = pricelist_rows::table
                    .filter(pricelist_rows::upload_id.eq(upload_id))
                    .filter(pricelist_rows::row_num.eq(update.row_num));

                count_updated += diesel::update(target)
                    .set((
                        pricelist_rows::supplier_sku.eq(update.supplier_sku.as_str()),
                        pricelist_rows::name.eq(update.name.as_str()),
                        pricelist_rows::price_cents.eq(update.price_cents),
                        pricelist_rows::currency.eq(update.currency.as_str()),
                        pricelist_rows::category_mapped.eq(update.category_mapped.as_deref()),
                        pricelist_rows::attrs_json.eq(attrs_json),
                        pricelist_rows::blocked.eq(update.blocked),
                        pricelist_rows::blocked_reason.eq(update.blocked_reason.as_deref()),
                    ))
                    .execute(conn)?;
            }

            Ok(count_updated)
        })
    }
}
