//! Export builders for study response data.
//!
//! Every builder pulls its recordset from a [`ResponseStore`] one page at a
//! time and never holds more than one page of records. CSV builders make two
//! passes: the first collects the header keys, the second writes rows.
//!
//! [`ResponseStore`]: lookit_core::store::ResponseStore

pub mod demographics;
pub mod error;
pub mod format;
pub mod framedata;
pub mod pages;
pub mod render;
pub mod responses;

pub use error::{Error, Result};
pub use format::{Artifact, DatasetLabel, ExportFormat};

#[cfg(test)]
mod tests;
