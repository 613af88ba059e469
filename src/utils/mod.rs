//! Utility modules for Arrow column extraction, table IO and logging.

pub mod arrow;
pub mod io;
pub mod logging;

pub use io::{read_table, read_tables_parallel, write_csv};
