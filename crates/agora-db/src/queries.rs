//! Row-level query functions, one module per table.

pub mod arguments;
pub mod ledgers;
pub mod stakes;
pub mod topics;
