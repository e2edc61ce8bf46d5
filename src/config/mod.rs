//! Builds the `AppConfig` from layered sources:
//! `config/base.toml`, then `config/{environment}.toml`, then `APP_`-prefixed environment variables
//! (`__` separates nested keys, e.g. `APP_NET_CONFIG__APP_PORT=9000`).
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::{path::Path, sync::OnceLock};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{
    AppConfig, DbConfig, EmailPolicy, Environment, NetConfig, PoolConfig, SslRequire,
    SubscribeConfig,
};

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong, use `try_init_config` to handle the error instead.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        try_init_config().unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

/// Builds the `AppConfig` for the environment named by `APP_ENVIRONMENT` (defaults to `local`),
/// reading the files from `./config`.
pub fn try_init_config() -> ConfigResult<AppConfig> {
    info!("{:<20} - Initializing the configuration", "try_init_config");
    let config_dir = std::env::current_dir()?.join("config");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()?;
    let database_url = std::env::var("DATABASE_URL").ok();

    let config = build_config(&config_dir, environment, database_url.as_deref())?;

    info!(
        "{:<20} - Environment: {}, email policy: {}",
        "try_init_config",
        environment.as_ref(),
        config.subscribe_config.email_policy.as_ref()
    );

    Ok(config)
}

/// `load_config`, plus the production rule: the connection string comes from `DATABASE_URL`
/// and has to be present.
fn build_config(
    config_dir: &Path,
    environment: Environment,
    database_url: Option<&str>,
) -> ConfigResult<AppConfig> {
    let mut config = load_config(config_dir, environment)?;

    if matches!(environment, Environment::Production) {
        let database_url = database_url.ok_or(ConfigError::MissingDatabaseUrl)?;
        config.db_config = DbConfig::try_from(database_url)?;
    }

    Ok(config)
}

/// Merges the base file, the environment file and the `APP_` environment variables
/// found in `config_dir` into an `AppConfig`.
pub fn load_config(config_dir: &Path, environment: Environment) -> ConfigResult<AppConfig> {
    let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

    let config = Figment::new()
        .merge(Toml::file(config_dir.join("base.toml")))
        .merge(Toml::file(config_dir.join(environment_filename)))
        .merge(Env::prefixed("APP_").split("__"))
        .extract()?;

    Ok(config)
}

// ###################################
// ->   TESTS
// ###################################
