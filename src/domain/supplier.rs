use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Domain representation of a supplier known to the catalog.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Supplier {
    /// Unique identifier of the supplier.
    pub id: i32,
    /// Human-readable supplier name.
    pub name: String,
    /// Short unique code used in integrations.
    pub code: String,
    /// ISO 4217 currency assumed when an upload does not carry one.
    pub default_currency: String,
    /// Whether the supplier may submit pricelists.
    pub is_active: bool,
    /// Timestamp for when the supplier record was created.
    pub created_at: NaiveDateTime,
}

/// Payload required to register a new supplier.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub code: String,
    pub default_currency: String,
    pub is_active: bool,
}

impl NewSupplier {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            default_currency: default_currency.into(),
            is_active: true,
        }
    }
}
