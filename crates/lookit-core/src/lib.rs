//! Core types and trait definitions for the Lookit response data pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the study-scoped ID hasher, the column registries, the frame-data
//! flattener and the consent ruling state machine. Storage, video objects and
//! background jobs are reached only through the traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod access;
pub mod collisions;
pub mod columns;
pub mod consent;
pub mod error;
pub mod fields;
pub mod flatten;
pub mod frames;
pub mod hash;
pub mod response;
pub mod store;
pub mod study;
pub mod video;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod fixtures;
