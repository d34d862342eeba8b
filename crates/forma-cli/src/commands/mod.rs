//! CLI command implementations for Forma.

pub mod check;
pub mod resolve;
