//! Financial metrics normalization
//!
//! Turns irregular provider datasets into a uniform period table:
//! the field resolver finds canonical fields behind provider labels, the
//! metric calculator derives ratios, and the table builder lays them out
//! one column per period. Nothing in here performs I/O or fails loudly.

pub mod field_resolver;
pub mod metrics;
pub mod table;

pub use field_resolver::{
    lookup, resolve, CanonicalField, FieldMap, FieldResolver, FieldSource, FieldValue,
    Resolution, ResolvedFields,
};
pub use metrics::{
    debt_ratio, ebitda, free_operating_cash_flow, funds_from_operations, MetricCell, MetricName,
};
pub use table::{
    build_table, format_amount, format_metric, MetricTable, TableBuilder, TableColumn,
    TableOutcome,
};
