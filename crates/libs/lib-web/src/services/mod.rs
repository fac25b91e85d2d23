//! # Web Services
//!
//! Business logic between the HTTP handlers and the data layer: the coin
//! action gate, the live balance feed, and persistent asset storage.

pub mod assets;
pub mod balance_feed;
pub mod gate;

pub use assets::AssetService;
pub use balance_feed::BalanceFeed;
pub use gate::{ActionGate, Hold};
