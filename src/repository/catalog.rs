use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::warn;

use crate::{
    domain::price_history::PriceHistory,
    domain::row::{PricelistRow, merge_attrs},
    domain::stock::StockOnHand,
    domain::supplier_product::{SupplierProduct, SupplierProductListQuery},
    domain::upload::{PricelistUpload, UploadStatus},
    models::price_history::{NewPriceHistory as DbNewPrice, PriceHistory as DbPrice},
    models::row::{parse_attrs, serialize_attrs},
    models::stock::{NewStockOnHand as DbNewStock, StockOnHand as DbStock},
    models::supplier_product::{
        NewSupplierProduct as DbNewProduct, SupplierProduct as DbProduct,
        UpdateSupplierProduct as DbUpdateProduct,
    },
    repository::{
        CatalogReader, CatalogWriter, DieselRepository, MergeOptions, MergeOutcome,
        errors::{RepositoryError, RepositoryResult},
    },
};

impl CatalogReader for DieselRepository {
    fn get_supplier_product(
        &self,
        supplier_id: i32,
        supplier_sku: &str,
    ) -> RepositoryResult<Option<SupplierProduct>> {
        use crate::schema::supplier_products;

        let mut conn = self.conn()?;
        let product = supplier_products::table
            .filter(supplier_products::supplier_id.eq(supplier_id))
            .filter(supplier_products::supplier_sku.eq(supplier_sku))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        product
            .map(|product| product.into_domain().map_err(Into::into))
            .transpose()
    }

    fn list_supplier_products(
        &self,
        query: SupplierProductListQuery,
    ) -> RepositoryResult<(usize, Vec<SupplierProduct>)> {
        use crate::schema::supplier_products;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = supplier_products::table
                .filter(supplier_products::supplier_id.eq(query.supplier_id))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if !query.include_inactive {
                items = items.filter(supplier_products::is_active.eq(true));
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

        let db_products = items
            .order(supplier_products::supplier_sku.asc())
            .load::<DbProduct>(&mut conn)?;

        let products = db_products
            .into_iter()
            .map(|product| product.into_domain().map_err(Into::into))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, products))
    }

    fn price_history(&self, supplier_product_id: i32) -> RepositoryResult<Vec<PriceHistory>> {
        use crate::schema::price_history;

        let mut conn = self.conn()?;
        let db_prices = price_history::table
            .filter(price_history::supplier_product_id.eq(supplier_product_id))
            .order(price_history::id.asc())
            .load::<DbPrice>(&mut conn)?;

        Ok(db_prices.into_iter().map(Into::into).collect())
    }

    fn stock_on_hand(&self, supplier_product_id: i32) -> RepositoryResult<Vec<StockOnHand>> {
        use crate::schema::stock_on_hand;

        let mut conn = self.conn()?;
        let db_stock = stock_on_hand::table
            .filter(stock_on_hand::supplier_product_id.eq(supplier_product_id))
            .order(stock_on_hand::location_id.asc())
            .load::<DbStock>(&mut conn)?;

        Ok(db_stock.into_iter().map(Into::into).collect())
    }
}

impl CatalogWriter for DieselRepository {
    fn merge_pricelist(
        &self,
        upload: &PricelistUpload,
        rows: &[PricelistRow],
        options: &MergeOptions,
    ) -> RepositoryResult<MergeOutcome> {
        use crate::schema::{pricelist_uploads, supplier_products};

        let mut conn = self.conn()?;

        conn.transaction::<MergeOutcome, RepositoryError, _>(|conn| {
            let merge_started_at = Utc::now().naive_utc();
            let mut outcome = MergeOutcome::default();

            for row in rows {
                match merge_row(conn, upload, row, options, merge_started_at) {
                    Ok(change) => {
                        if change.created {
                            outcome.products_created += 1;
                        } else {
                            outcome.products_updated += 1;
                        }
                        if change.price_changed {
                            outcome.prices_changed += 1;
                        }
                        if change.stock_updated {
                            outcome.stock_updated += 1;
                        }
                    }
                    Err(err) if !options.strict => {
                        warn!(
                            "upload {}: row {} skipped during merge: {err}",
                            upload.id, row.row_num
                        );
                        outcome
                            .row_errors
                            .push(format!("row {}: {err}", row.row_num));
                    }
                    Err(err) => {
                        return Err(RepositoryError::Conflict(format!(
                            "row {} failed in strict mode: {err}",
                            row.row_num
                        )));
                    }
                }
            }

            // Active SKUs the upload no longer mentions drop out of the catalog.
            let deactivation_target = supplier_products::table
                .filter(supplier_products::supplier_id.eq(upload.supplier_id))
                .filter(supplier_products::is_active.eq(true))
                .filter(supplier_products::last_seen_at.lt(merge_started_at));
            outcome.products_deactivated = diesel::update(deactivation_target)
                .set((
                    supplier_products::is_active.eq(false),
                    supplier_products::updated_at.eq(merge_started_at),
                ))
                .execute(conn)?;

            // The upload leaves `merging` inside the same transaction, so a
            // rollback also rolls the status back.
            let status_target = pricelist_uploads::table
                .filter(pricelist_uploads::id.eq(upload.id))
                .filter(pricelist_uploads::status.eq(UploadStatus::Merging.as_str()));
            let moved = diesel::update(status_target)
                .set((
                    pricelist_uploads::status.eq(UploadStatus::Merged.as_str()),
                    pricelist_uploads::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            if moved == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "upload {} left the merging state mid-merge",
                    upload.id
                )));
            }

            Ok(outcome)
        })
    }
}

struct RowChange {
    created: bool,
    price_changed: bool,
    stock_updated: bool,
}

fn merge_row(
    conn: &mut SqliteConnection,
    upload: &PricelistUpload,
    row: &PricelistRow,
    options: &MergeOptions,
    now: NaiveDateTime,
) -> RepositoryResult<RowChange> {
    use crate::schema::supplier_products;

    let existing = supplier_products::table
        .filter(supplier_products::supplier_id.eq(upload.supplier_id))
        .filter(supplier_products::supplier_sku.eq(&row.supplier_sku))
        .first::<DbProduct>(conn)
        .optional()?;

    let (product_id, created) = match existing {
        Some(existing) => {
            let existing_attrs = parse_attrs(existing.attrs_json.as_deref())?;
            let merged_attrs = merge_attrs(existing_attrs.as_ref(), row.attrs.as_ref());
            let updates = DbUpdateProduct {
                name_from_supplier: row.name.as_str(),
                brand: row.brand.as_deref(),
                uom: row.uom.as_deref(),
                pack_size: row.pack_size.as_deref(),
                barcode: row.barcode.as_deref(),
                category: row.category_mapped.as_deref(),
                attrs_json: serialize_attrs(merged_attrs.as_ref())?,
                is_active: true,
                is_new: false,
                last_seen_at: now,
                updated_at: now,
            };
            diesel::update(supplier_products::table.find(existing.id))
                .set(&updates)
                .execute(conn)?;
            (existing.id, false)
        }
        None => {
            let new_product = DbNewProduct {
                supplier_id: upload.supplier_id,
                supplier_sku: row.supplier_sku.as_str(),
                name_from_supplier: row.name.as_str(),
                brand: row.brand.as_deref(),
                uom: row.uom.as_deref(),
                pack_size: row.pack_size.as_deref(),
                barcode: row.barcode.as_deref(),
                category: row.category_mapped.as_deref(),
                attrs_json: serialize_attrs(row.attrs.as_ref())?,
                is_active: true,
                is_new: true,
                first_seen_at: now,
                last_seen_at: now,
                created_at: now,
                updated_at: now,
            };
            let created = diesel::insert_into(supplier_products::table)
                .values(&new_product)
                .get_result::<DbProduct>(conn)?;
            (created.id, true)
        }
    };

    let price_changed = record_price(conn, product_id, row, upload.valid_from)?;
    let stock_updated = match row.qty {
        Some(qty) => {
            record_stock(conn, product_id, options.location_id, qty, now)?;
            true
        }
        None => false,
    };

    Ok(RowChange {
        created,
        price_changed,
        stock_updated,
    })
}

/// Closes the current price interval and opens a new one when the price or
/// currency differs. An unchanged price leaves the timeline untouched.
fn record_price(
    conn: &mut SqliteConnection,
    supplier_product_id: i32,
    row: &PricelistRow,
    valid_from: NaiveDateTime,
) -> RepositoryResult<bool> {
    use crate::schema::price_history;

    let current = price_history::table
        .filter(price_history::supplier_product_id.eq(supplier_product_id))
        .filter(price_history::is_current.eq(true))
        .first::<DbPrice>(conn)
        .optional()?;

    if let Some(current) = &current {
        if current.price_cents == row.price_cents && current.currency == row.currency {
            return Ok(false);
        }
        diesel::update(price_history::table.find(current.id))
            .set((
                price_history::valid_to.eq(Some(valid_from)),
                price_history::is_current.eq(false),
            ))
            .execute(conn)?;
    }

    let new_price = DbNewPrice {
        supplier_product_id,
        price_cents: row.price_cents,
        currency: row.currency.as_str(),
        valid_from,
        is_current: true,
    };
    diesel::insert_into(price_history::table)
        .values(&new_price)
        .execute(conn)?;

    Ok(true)
}

/// Overwrites the quantity snapshot for one (product, location) pair.
fn record_stock(
    conn: &mut SqliteConnection,
    supplier_product_id: i32,
    location_id: i32,
    qty: i64,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    use crate::schema::stock_on_hand;

    let target = stock_on_hand::table
        .filter(stock_on_hand::supplier_product_id.eq(supplier_product_id))
        .filter(stock_on_hand::location_id.eq(location_id));
    let updated = diesel::update(target)
        .set((
            stock_on_hand::qty.eq(qty),
            stock_on_hand::as_of_ts.eq(now),
        ))
        .execute(conn)?;

    if updated == 0 {
        let new_stock = DbNewStock {
            supplier_product_id,
            location_id,
            qty,
            as_of_ts: now,
        };
        diesel::insert_into(stock_on_hand::table)
            .values(&new_stock)
            .execute(conn)?;
    }

    Ok(())
}
