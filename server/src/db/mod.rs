//! Database module for PostgreSQL persistence.

mod budgets;
mod pool;

pub use budgets::*;
pub use pool::*;
