//! Shared helpers for handler and service tests: in-memory database with the
//! production schema, seeded users, and a router wired with test state.

use crate::server::AppState;
use crate::services::{ActionGate, AssetService, BalanceFeed};
use lib_core::{Config, DbPool};
use lib_tools::{AnalystClient, MarketHttpClient, NewsClient};
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const TEST_JWT_SECRET: &str = "test-secret-key-must-be-at-least-32-chars-long!";

pub(crate) async fn setup_test_db() -> DbPool {
    let pool = DbPool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test pool");

    for ddl in [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_login TIMESTAMP,
            is_active BOOLEAN NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS coin_accounts (
            user_id INTEGER PRIMARY KEY,
            balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            tool TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            state TEXT NOT NULL DEFAULT 'reserved',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            settled_at TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            url TEXT NOT NULL,
            settings TEXT NOT NULL DEFAULT '{}',
            width INTEGER NOT NULL,
            height INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ] {
        sqlx::query(ddl)
            .execute(&pool)
            .await
            .expect("Failed to create test schema");
    }

    pool
}

/// Insert a user with a coin account at the given balance. Returns the user id.
pub(crate) async fn seed_user(pool: &DbPool, username: &str, balance: i64) -> i64 {
    let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
        .bind(username)
        .bind(format!("{}@example.com", username))
        .bind("$argon2id$fake-hash-for-tests")
        .execute(pool)
        .await
        .expect("Failed to seed user");
    let user_id = result.last_insert_rowid();

    sqlx::query("INSERT INTO coin_accounts (user_id, balance) VALUES (?, ?)")
        .bind(user_id)
        .bind(balance)
        .execute(pool)
        .await
        .expect("Failed to seed coin account");

    user_id
}

pub(crate) fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_hours: 24,
        asset_store_dir: std::env::temp_dir()
            .join(format!("coinforge-test-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        market_api_base: "http://127.0.0.1:9".to_string(),
        quote_suffix: "USDT".to_string(),
        news_api_base: "http://127.0.0.1:9".to_string(),
        news_api_key: String::new(),
        news_fallback_base: "http://127.0.0.1:9".to_string(),
        llm_api_base: "http://127.0.0.1:9".to_string(),
        llm_api_key: String::new(),
        llm_model: "test-model".to_string(),
        signup_grant: 25,
    }
}

/// Build an `AppState` over the given pool with offline client stubs.
///
/// The market/news/analyst clients point at an unroutable address; tests
/// that exercise them assert on the error path only.
pub(crate) fn test_state(pool: DbPool) -> AppState {
    let config = test_config();
    let feed = BalanceFeed::new(16);

    AppState {
        gate: ActionGate::new(pool.clone(), feed.clone()),
        assets: AssetService::new(config.asset_store_dir.clone()),
        market: Arc::new(
            MarketHttpClient::new(config.market_api_base.clone(), config.quote_suffix.clone())
                .expect("test market client"),
        ),
        news: Arc::new(
            NewsClient::new(
                config.news_api_base.clone(),
                config.news_api_key.clone(),
                config.news_fallback_base.clone(),
            )
            .expect("test news client"),
        ),
        analyst: Arc::new(
            AnalystClient::new(
                config.llm_api_base.clone(),
                config.llm_api_key.clone(),
                config.llm_model.clone(),
            )
            .expect("test analyst client"),
        ),
        feed,
        db: pool,
        config,
    }
}

/// Claims for a seeded user, for injecting into request extensions.
pub(crate) fn test_claims(user_id: i64, username: &str) -> lib_auth::Claims {
    let now = chrono::Utc::now().timestamp();
    lib_auth::Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: now + 3600,
        iat: now,
    }
}
