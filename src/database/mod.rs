use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::{AppConfig, DbConfig, PoolConfig};

/// Owns the process-wide connection pool.
/// Connections are acquired per query and returned to the pool when dropped.
#[derive(Clone, Debug)]
pub struct DbManager {
    db: PgPool,
    /// Set when the database was created by `test_init` and belongs to this manager.
    test_db: Option<String>,
}

impl DbManager {
    /// Creates the pool without connecting.
    /// The first query opens the first connection, so the server can start while the store is down.
    pub fn init(config: &AppConfig) -> Self {
        info!("{:<20} - Initializing the DB pool", "init_db");
        let db = lazy_pool(&config.db_config, &config.pool_config);

        Self { db, test_db: None }
    }

    /// Applies the migrations embedded from `./migrations`.
    pub async fn migrate(&self) -> Result<()> {
        info!("{:<20} - Running migrations", "migrate_db");
        sqlx::migrate!("./migrations").run(&self.db).await?;

        Ok(())
    }

    /// Creates a fresh, uniquely named database on the configured server,
    /// migrates it and returns a manager pointing at it.
    pub async fn test_init(config: &AppConfig) -> Result<Self> {
        let mut db_config = config.db_config.clone();
        db_config.db_name = format!("test_{}", Uuid::new_v4().simple());

        let mut connection =
            PgConnection::connect_with(&db_config.connection_options_without_db()).await?;
        let sql = format!(r#"CREATE DATABASE "{}";"#, db_config.db_name);
        sqlx::query(&sql).execute(&mut connection).await?;
        connection.close().await?;

        let dm = Self {
            db: lazy_pool(&db_config, &config.pool_config),
            test_db: Some(db_config.db_name),
        };
        dm.migrate().await?;

        Ok(dm)
    }

    /// Closes the pool and drops the database created by `test_init`.
    /// Does nothing else for a manager built by `init`.
    pub async fn test_teardown(self, config: &AppConfig) -> Result<()> {
        self.db.close().await;

        let Some(db_name) = self.test_db else {
            return Ok(());
        };
        let mut connection =
            PgConnection::connect_with(&config.db_config.connection_options_without_db()).await?;
        // FORCE also ends sessions that clones of this pool may still hold.
        let sql = format!(r#"DROP DATABASE IF EXISTS "{db_name}" WITH (FORCE);"#);
        sqlx::query(&sql).execute(&mut connection).await?;
        connection.close().await?;

        info!("{:<20} - Dropped test database {db_name}", "test_teardown");
        Ok(())
    }

    pub fn test_db_name(&self) -> Option<&str> {
        self.test_db.as_deref()
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

fn lazy_pool(db_config: &DbConfig, pool_config: &PoolConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(pool_config.max_connections)
        .acquire_timeout(pool_config.acquire_timeout())
        .connect_lazy_with(db_config.connection_options())
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
