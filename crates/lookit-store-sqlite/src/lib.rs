//! SQLite backend for the Lookit response query layer.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod import;

pub use error::{Error, Result};
pub use import::{FixtureBundle, ImportReport};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
