//! Trade route search and ranking on top of UEX market data.

pub mod domain;
pub mod infra;
pub mod ui;
pub mod util;
