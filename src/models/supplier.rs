use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::supplier::{NewSupplier as DomainNewSupplier, Supplier as DomainSupplier};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::suppliers)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub default_currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::suppliers)]
pub struct NewSupplier<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub default_currency: &'a str,
    pub is_active: bool,
}

impl From<Supplier> for DomainSupplier {
    fn from(value: Supplier) -> Self {
        Self {
            id: value.id,
            name: value.name,
            code: value.code,
            default_currency: value.default_currency,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

impl<'a> From<&'a DomainNewSupplier> for NewSupplier<'a> {
    fn from(value: &'a DomainNewSupplier) -> Self {
        Self {
            name: value.name.as_str(),
            code: value.code.as_str(),
            default_currency: value.default_currency.as_str(),
            is_active: value.is_active,
        }
    }
}
