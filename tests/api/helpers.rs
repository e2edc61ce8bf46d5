//! Spawns the app on a random port with its own freshly migrated database.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::OnceLock,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;
use waitlist::{
    config::{get_or_init_config, EmailPolicy},
    database::DbManager,
    init_dbg_tracing, App, AppState,
};

/// Trying to bind port 0 will trigger an OS scan for an available port
/// which will then be bound to the application.
const TEST_SOCK_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);

/// Logs are only printed when `TEST_LOG` is set.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub dm: DbManager,
    pub http_client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_policy(EmailPolicy::Minimal).await
    }

    pub async fn spawn_with_policy(email_policy: EmailPolicy) -> Result<Self> {
        init_test_subscriber();

        let config = get_or_init_config();
        let dm = DbManager::test_init(config).await?;
        let app_state = AppState::new(dm.clone(), email_policy);

        let listener = TcpListener::bind(&TEST_SOCK_ADDR).await?;
        let addr = listener.local_addr()?;
        info!("Listening on {addr}");

        tokio::spawn(waitlist::serve(App::new(app_state, listener)));

        Ok(TestApp {
            addr,
            dm,
            http_client: reqwest::Client::new(),
        })
    }

    /// Drops the database created for this app. Call it at the end of every test.
    pub async fn cleanup(self) -> Result<()> {
        self.dm.test_teardown(get_or_init_config()).await?;

        Ok(())
    }

    pub async fn api_subscribe_post(&self, body: &Value) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(format!("http://{}/api/subscribe", self.addr))
            .json(body)
            .send()
            .await?;

        Ok(res)
    }

    /// Posts `body` as is, with an optional `Content-Type`.
    pub async fn api_subscribe_post_raw(
        &self,
        body: impl Into<reqwest::Body>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .http_client
            .post(format!("http://{}/api/subscribe", self.addr))
            .body(body);
        if let Some(content_type) = content_type {
            req = req.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        Ok(req.send().await?)
    }

    /// Every stored subscriber, ordered by email.
    pub async fn subscribers(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        let rows = sqlx::query_as("SELECT email, created_at FROM subscribers ORDER BY email")
            .fetch_all(self.dm.db())
            .await?;

        Ok(rows)
    }
}
