pub mod audit;
pub mod price_history;
pub mod row;
pub mod rule;
pub mod rule_execution;
pub mod stock;
pub mod supplier;
pub mod supplier_product;
pub mod upload;
