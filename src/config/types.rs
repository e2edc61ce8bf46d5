//! The configuration structs used to build the AppConfig, and their impls.
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use strum_macros::AsRefStr;
use url::Url;

use crate::config::ConfigError;

// ###################################
// ->   STRUCTS
// ###################################
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub db_config: DbConfig,
    pub pool_config: PoolConfig,
    #[serde(default)]
    pub subscribe_config: SubscribeConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub db_name: String,
    pub require_ssl: SslRequire,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SslRequire {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

/// Settings of the process-wide connection pool.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_millis: u64,
    /// Run the embedded migrations before the server starts accepting requests.
    pub migrate_on_start: bool,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscribeConfig {
    #[serde(default)]
    pub email_policy: EmailPolicy,
}

/// How thoroughly a submitted email address gets checked before it is stored.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr)]
pub enum EmailPolicy {
    /// The address only has to contain an '@'.
    #[default]
    Minimal,
    /// Length limit plus a full syntax check. Deliverability is never checked.
    Strict,
}

// ###################################
// ->   IMPLs
// ###################################
impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_millis)
    }
}

impl DbConfig {
    pub fn connection_options(&self) -> PgConnectOptions {
        self.connection_options_without_db().database(&self.db_name)
    }
    pub fn connection_options_without_db(&self) -> PgConnectOptions {
        // Create new PgConnectOptions struct but don't try to use the '$HOME/.pgpass' file.
        PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(self.require_ssl.into())
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

impl From<SslRequire> for PgSslMode {
    fn from(value: SslRequire) -> Self {
        match value {
            SslRequire::Disable => PgSslMode::Disable,
            SslRequire::Allow => PgSslMode::Allow,
            SslRequire::Prefer => PgSslMode::Prefer,
            SslRequire::Require => PgSslMode::Require,
            SslRequire::VerifyCa => PgSslMode::VerifyCa,
            SslRequire::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}

impl TryFrom<&str> for SslRequire {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "disable" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            _ => Err(Self::Error::StringToDbConfigFail),
        }
    }
}

/// Percent-decodes one component of a connection URL.
fn decode_component(value: &str) -> Result<String, ConfigError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ConfigError::StringToDbConfigFail)
}

impl TryFrom<&str> for DbConfig {
    type Error = ConfigError;

    /// Parses `postgres[ql]://{username}[:{password}]@{host}[:{port}]/{database}[?{options}]`.
    /// Credentials and the database name may be percent-encoded. The port defaults to 5432.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(value).map_err(|_| Self::Error::StringToDbConfigFail)?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(Self::Error::StringToDbConfigFail);
        }

        let username = decode_component(url.username())?;
        if username.is_empty() {
            return Err(Self::Error::StringToDbConfigFail);
        }
        let password = SecretString::from(decode_component(url.password().unwrap_or_default())?);

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or(Self::Error::StringToDbConfigFail)?
            .to_string();
        let port = url.port().unwrap_or(5432);

        let db_name = decode_component(url.path().trim_start_matches('/'))?;
        if db_name.is_empty() || db_name.contains('/') {
            return Err(Self::Error::StringToDbConfigFail);
        }

        let mut require_ssl = SslRequire::default();
        for (key, val) in url.query_pairs() {
            if key == "sslmode" {
                require_ssl = SslRequire::try_from(&*val)?;
            }
        }

        Ok(DbConfig {
            username,
            password,
            port,
            host,
            db_name,
            require_ssl,
        })
    }
}

// ###################################
// ->   TESTS
// ###################################
