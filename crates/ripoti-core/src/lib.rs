//! Core types and trait definitions for the Ripoti clinic report board.
//!
//! This crate has no HTTP or database dependencies.
//! The store backend and the server both depend on it.

pub mod error;
pub mod mention;
pub mod query;
pub mod report;
pub mod store;
pub mod time;
pub mod user;
pub mod username;

pub use error::{DomainError, Error, Result};
