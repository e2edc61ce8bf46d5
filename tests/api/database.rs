//! Tests the lifecycle of the per-test databases.

use anyhow::Result;
use sqlx::{Connection, PgConnection};
use waitlist::config::get_or_init_config;

use crate::helpers::TestApp;

async fn database_exists(db_name: &str) -> Result<bool> {
    let config = get_or_init_config();
    let mut connection =
        PgConnection::connect_with(&config.db_config.connection_options_without_db()).await?;
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&mut connection)
            .await?;
    connection.close().await?;

    Ok(exists)
}

#[tokio::test]
async fn cleanup_drops_the_test_database() -> Result<()> {
    let app = TestApp::spawn().await?;
    let db_name = app
        .dm
        .test_db_name()
        .expect("spawned apps own a test database")
        .to_string();
    assert!(database_exists(&db_name).await?);

    // A request leaves a connection checked into the pool the server holds.
    app.api_subscribe_post(&serde_json::json!({ "email": "user@example.com" }))
        .await?
        .error_for_status()?;

    app.cleanup().await?;

    assert!(!database_exists(&db_name).await?);

    Ok(())
}
