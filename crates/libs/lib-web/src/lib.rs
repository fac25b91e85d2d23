//! # Web Library
//!
//! HTTP handlers, middleware, routes, and web services.

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;

pub use server::{start_server, AppState, ServerConfig};

#[cfg(test)]
pub(crate) mod test_support;
