//! Coin balance and purchase DTOs.

use serde::{Deserialize, Serialize};

/// Current coin balance for the authenticated user.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// Purchase request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub package_id: String,
}

/// Purchase result: coins credited and the new balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub credited: i64,
    pub balance: i64,
}

/// Balance feed event pushed over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEvent {
    pub user_id: i64,
    pub balance: i64,
}
