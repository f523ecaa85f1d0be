//! Request handlers for budget operations.

mod budgets;

pub use budgets::*;
