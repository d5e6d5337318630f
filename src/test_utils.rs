use crate::{AppState, config::Config, db::DBClient, db::RoleExt};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static UNIQUE: AtomicU32 = AtomicU32::new(0);

/// Process-unique suffix for usernames and emails, so tests sharing a
/// database never collide with each other or with leftovers of earlier runs
pub fn unique_tag() -> String {
    let n = UNIQUE.fetch_add(1, Ordering::Relaxed);
    format!("{}x{}", std::process::id(), n)
}

fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        jwt_secret: "test-signing-secret".to_string(),
        jwt_maxage: 86400,
        port: 8000,
        frontend_url: "http://localhost:3000".to_string(),
    }
}

/// AppState over the database named by TEST_DATABASE_URL, which must carry
/// the migrated schema. Returns None when the variable is unset so callers
/// can skip instead of failing.
pub async fn test_app_state() -> Option<AppState> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .ok()?;

    let db_client = DBClient::new(pool);

    // Registration depends on the seeded "user" role being present
    if db_client.get_role_by_name("user").await.ok()?.is_none() {
        db_client.save_role("user").await.ok()?;
    }

    Some(AppState {
        env: Arc::new(test_config(database_url)),
        db_client,
    })
}

/// AppState over a lazy pool that never connects. Handler paths that must
/// fail before issuing any query return their own error; anything that does
/// touch the pool surfaces a connection failure instead.
pub fn lazy_app_state() -> AppState {
    let database_url = "postgres://localhost:1/unreachable".to_string();

    let pool = PgPoolOptions::new()
        .connect_lazy(&database_url)
        .expect("connection string parses");

    AppState {
        env: Arc::new(test_config(database_url)),
        db_client: DBClient::new(pool),
    }
}
