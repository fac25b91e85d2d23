//! # Data Model
//!
//! Database store and entity models.

pub mod store;
