//! Maintenance tools for the translation copy store: seed migration, status
//! checks, bulk clearing and language reconciliation.

pub mod config;
pub mod duplicates;
pub mod error;
pub mod i18n;
pub mod language_fix;
pub mod migration;
pub mod models;
mod retry;
pub mod seed;
pub mod status;
pub mod store;
