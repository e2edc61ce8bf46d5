use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, Instrument, Span};

use crate::{
    web::{
        types::{DeserSubscriber, SubscribeResponse, ValidSubscriber},
        WebResult,
    },
    AppState,
};

/// Adds an email to the waitlist.
/// Submitting an address that is already on the list only refreshes its `created_at`.
/// The body is read as JSON whatever its `Content-Type` says.
#[tracing::instrument(
    name = "Adding subscriber to the waitlist",
    skip(app_state, body),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> WebResult<Json<SubscribeResponse>> {
    let subscriber: DeserSubscriber = serde_json::from_slice(&body?)?;
    let subscriber = subscriber.validate(app_state.email_policy)?;
    Span::current().record("subscriber_email", subscriber.email.as_ref());

    let created_at = upsert_subscriber(app_state.database_mgr.db(), &subscriber).await?;
    info!("Subscriber recorded at {created_at}");

    Ok(Json(SubscribeResponse::accepted()))
}

/// Inserts the subscriber, or refreshes `created_at` if the email is already stored.
/// Returns the timestamp that was written.
async fn upsert_subscriber(db: &PgPool, subscriber: &ValidSubscriber) -> WebResult<DateTime<Utc>> {
    let created_at = Utc::now();

    let q_span = tracing::info_span!("Upserting subscriber in the database");
    sqlx::query(
        r#"
        INSERT INTO subscribers (email, created_at)
        VALUES ($1, $2)
        ON CONFLICT (email) DO UPDATE SET created_at = EXCLUDED.created_at
    "#,
    )
    .bind(subscriber.email.as_ref())
    .bind(created_at)
    .execute(db)
    .instrument(q_span)
    .await?;

    Ok(created_at)
}
