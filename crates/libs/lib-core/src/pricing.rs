//! # Tool Pricing
//!
//! Static price table for paid tools and the coin purchase packages.
//! Both are data, fixed at compile time and immutable at runtime.

use serde::{Deserialize, Serialize};

/// A single priced user-facing capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    RemoveBackground,
    Resize,
    MarketAnalysis,
}

impl ToolId {
    /// All tools in the price table.
    pub const ALL: [ToolId; 3] = [
        ToolId::RemoveBackground,
        ToolId::Resize,
        ToolId::MarketAnalysis,
    ];

    /// Fixed price in coins for one invocation.
    pub fn price(&self) -> i64 {
        match self {
            ToolId::RemoveBackground => 5,
            ToolId::Resize => 2,
            ToolId::MarketAnalysis => 10,
        }
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolId::RemoveBackground => write!(f, "remove-background"),
            ToolId::Resize => write!(f, "resize"),
            ToolId::MarketAnalysis => write!(f, "market-analysis"),
        }
    }
}

impl std::str::FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove-background" => Ok(ToolId::RemoveBackground),
            "resize" => Ok(ToolId::Resize),
            "market-analysis" => Ok(ToolId::MarketAnalysis),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

/// A purchasable coin package.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoinPackage {
    pub id: &'static str,
    /// Base coin amount
    pub coins: i64,
    /// Extra coins granted on top of `coins`
    pub bonus: i64,
    /// Fiat price in US cents
    pub price_cents: i64,
}

impl CoinPackage {
    /// Total coins credited when this package is purchased.
    pub fn total_coins(&self) -> i64 {
        self.coins + self.bonus
    }
}

/// The purchase-package table shown in the coin store.
pub const PACKAGES: [CoinPackage; 3] = [
    CoinPackage {
        id: "starter",
        coins: 100,
        bonus: 0,
        price_cents: 499,
    },
    CoinPackage {
        id: "plus",
        coins: 550,
        bonus: 50,
        price_cents: 1999,
    },
    CoinPackage {
        id: "pro",
        coins: 1200,
        bonus: 200,
        price_cents: 3999,
    },
];

/// Look up a purchase package by identifier.
pub fn find_package(id: &str) -> Option<&'static CoinPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_all_prices_positive() {
        for tool in ToolId::ALL {
            assert!(tool.price() > 0, "{} must have a positive price", tool);
        }
    }

    #[test]
    fn test_tool_id_roundtrip() {
        for tool in ToolId::ALL {
            assert_eq!(ToolId::from_str(&tool.to_string()).unwrap(), tool);
        }
    }

    #[test]
    fn test_unknown_tool_rejected() {
        assert!(ToolId::from_str("mint-nft").is_err());
    }

    #[test]
    fn test_package_lookup() {
        let plus = find_package("plus").expect("plus package should exist");
        assert_eq!(plus.total_coins(), 600);
        assert!(find_package("nonexistent").is_none());
    }
}
