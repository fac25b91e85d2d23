//! # Coin Handlers
//!
//! Balance reads, the purchase-package table, and coin purchases. The coin
//! store (database) is the single source of truth; handlers never cache
//! balances, and purchases go through the [`ActionGate`] so connected
//! clients see the credit on the balance feed.

use crate::services::ActionGate;
use axum::extract::{Extension, Json, State};
use lib_auth::Claims;
use lib_core::dto::{BalanceResponse, PurchaseRequest, PurchaseResponse};
use lib_core::pricing::{find_package, ToolId, CoinPackage, PACKAGES};
use lib_core::{AppError, Result};
use serde::Serialize;
use tracing::{info, instrument};

/// Price table + package table, for the store page.
#[derive(Debug, Serialize)]
pub struct StoreCatalog {
    pub packages: &'static [CoinPackage],
    pub prices: Vec<ToolPrice>,
}

#[derive(Debug, Serialize)]
pub struct ToolPrice {
    pub tool: ToolId,
    pub price: i64,
}

/// `GET /api/coins/balance` - current balance for the authenticated user.
pub async fn get_balance(
    Extension(claims): Extension<Claims>,
    State(gate): State<ActionGate>,
) -> Result<Json<BalanceResponse>> {
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    let balance = gate.balance(user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// `GET /api/coins/packages` - static purchase packages and tool prices.
pub async fn get_packages() -> Json<StoreCatalog> {
    Json(StoreCatalog {
        packages: &PACKAGES,
        prices: ToolId::ALL
            .iter()
            .map(|&tool| ToolPrice {
                tool,
                price: tool.price(),
            })
            .collect(),
    })
}

/// `POST /api/coins/purchase` - buy a coin package.
///
/// Payment collection is out of scope here; the package id stands in for a
/// completed checkout. Credits `coins + bonus` and returns the new balance.
#[instrument(skip(claims, gate), fields(username = %claims.username))]
pub async fn purchase(
    Extension(claims): Extension<Claims>,
    State(gate): State<ActionGate>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>> {
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    let package = find_package(&req.package_id)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown package: {}", req.package_id)))?;

    let credited = package.total_coins();
    let balance = gate.credit(user_id, credited).await?;

    info!(
        user_id,
        package = package.id,
        credited,
        balance,
        "[COINS] Purchase completed"
    );

    Ok(Json(PurchaseResponse { credited, balance }))
}
