//! Common types and utilities shared across Spot Oracle components

pub mod config;
pub mod error;
pub mod exchange;
pub mod types;

pub use config::*;
pub use error::*;
pub use exchange::*;
pub use types::*;
