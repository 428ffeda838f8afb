use diesel::prelude::*;

use crate::{
    domain::supplier::{NewSupplier, Supplier},
    models::supplier::{NewSupplier as DbNewSupplier, Supplier as DbSupplier},
    repository::{DieselRepository, SupplierReader, SupplierWriter, errors::RepositoryResult},
};

impl SupplierReader for DieselRepository {
    fn get_supplier_by_id(&self, id: i32) -> RepositoryResult<Option<Supplier>> {
        use crate::schema::suppliers;

        let mut conn = self.conn()?;
        let supplier = suppliers::table
            .find(id)
            .first::<DbSupplier>(&mut conn)
            .optional()?;

        Ok(supplier.map(Into::into))
    }

    fn list_suppliers(&self) -> RepositoryResult<Vec<Supplier>> {
        use crate::schema::suppliers;

        let mut conn = self.conn()?;
        let db_suppliers = suppliers::table
            .order(suppliers::name.asc())
            .load::<DbSupplier>(&mut conn)?;

        Ok(db_suppliers.into_iter().map(Into::into).collect())
    }
}

impl SupplierWriter for DieselRepository {
    fn create_supplier(&self, new_supplier: &NewSupplier) -> RepositoryResult<Supplier> {
        use crate::schema::suppliers;

        let mut conn = self.conn()?;
        let db_new: DbNewSupplier = new_supplier.into();

        let created = diesel::insert_into(suppliers::table)
            .values(&db_new)
            .get_result::<DbSupplier>(&mut conn)?;

        Ok(created.into())
    }
}
