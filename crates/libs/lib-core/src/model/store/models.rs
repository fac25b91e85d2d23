use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Data structure for creating a new user.
///
/// Password should be hashed before creating.
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl UserForCreate {
    /// Create a new `UserForCreate` instance.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
        }
    }
}

/// Lifecycle state of a coin hold.
///
/// Every paid action first reserves its price (`Reserved`), then settles to
/// `Committed` when the action succeeded or `Released` (refund) when it
/// failed. A hold never moves out of a settled state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HoldState {
    Reserved,
    Committed,
    Released,
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldState::Reserved => write!(f, "reserved"),
            HoldState::Committed => write!(f, "committed"),
            HoldState::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for HoldState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reserved" => Ok(HoldState::Reserved),
            "committed" => Ok(HoldState::Committed),
            "released" => Ok(HoldState::Released),
            _ => Err(format!("Invalid hold state: {}", s)),
        }
    }
}

impl From<String> for HoldState {
    fn from(s: String) -> Self {
        use std::str::FromStr;
        // Treat unknown database data as settled so it can never be spent twice
        HoldState::from_str(&s).unwrap_or(HoldState::Released)
    }
}

/// Durable ledger record of one coin hold.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub tool: String,
    /// Coins held (always positive)
    pub amount: i64,
    #[sqlx(try_from = "String")]
    pub state: HoldState,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Promoted processed asset: an object file plus this metadata record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub user_id: i64,
    /// Type discriminator ("remove-background", "resize")
    pub kind: String,
    /// Public URL path of the stored object
    pub url: String,
    /// Original tool settings, as a JSON blob
    pub settings: String,
    pub width: i64,
    pub height: i64,
    pub created_at: DateTime<Utc>,
}

/// Data structure for inserting a new asset record.
#[derive(Debug, Clone)]
pub struct AssetForCreate {
    pub user_id: i64,
    pub kind: String,
    pub url: String,
    pub settings: String,
    pub width: i64,
    pub height: i64,
}
