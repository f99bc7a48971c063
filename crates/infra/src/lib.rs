//! Infrastructure layer: record store gateway, directory services, config.

pub mod config;
pub mod context;
pub mod error;
pub mod record_store;
pub mod services;

pub use config::DirectoryConfig;
pub use context::Directory;
pub use error::{DirectoryError, DirectoryResult};

#[cfg(test)]
mod integration_tests;
