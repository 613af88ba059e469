//! Column names, table schemas and the frozen feature order.

pub mod columns;
pub mod frozen;
pub mod tables;

pub use frozen::FrozenSchema;
pub use tables::{
    beneficiary_schema, inpatient_schema, merged_schema, outpatient_schema, require_columns,
};
