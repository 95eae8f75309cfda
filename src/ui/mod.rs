//! Terminal output.

pub mod route_table;
