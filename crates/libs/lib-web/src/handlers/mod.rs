//! # HTTP Handlers
//!
//! Request handlers grouped by surface: auth, coins, paid tools, assets,
//! market data, and the balance WebSocket.

pub mod assets;
pub mod auth;
pub mod coins;
pub mod market;
pub mod tools;
pub mod ws;
