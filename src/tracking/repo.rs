use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TrackingEvent {
    pub id: Uuid,
    pub tracking_id: String,
    pub status: String,
    pub location: String,
    pub updated_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTrackingEvent {
    pub tracking_id: String,
    pub status: String,
    pub location: String,
    pub updated_by: String,
}

/// Append an event and copy its status onto the parcel.
///
/// `delivery_status` is left alone; only `tracking_status` and `last_update`
/// change. Returns `None` when no parcel has the tracking id.
pub async fn append(db: &PgPool, new: &NewTrackingEvent) -> anyhow::Result<Option<TrackingEvent>> {
    let mut tx = db.begin().await.context("begin tracking transaction")?;

    let now = OffsetDateTime::now_utc();
    let touched = sqlx::query(
        "UPDATE parcels SET tracking_status = $1, last_update = $2 WHERE tracking_id = $3",
    )
    .bind(&new.status)
    .bind(now)
    .bind(&new.tracking_id)
    .execute(&mut *tx)
    .await
    .context("denormalize tracking status")?;

    if touched.rows_affected() == 0 {
        tx.rollback().await.context("rollback tracking")?;
        return Ok(None);
    }

    let event = sqlx::query_as::<_, TrackingEvent>(
        r#"
        INSERT INTO tracking_events (tracking_id, status, location, updated_by, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, tracking_id, status, location, updated_by, recorded_at
        "#,
    )
    .bind(&new.tracking_id)
    .bind(&new.status)
    .bind(&new.location)
    .bind(&new.updated_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .context("insert tracking event")?;

    tx.commit().await.context("commit tracking")?;
    Ok(Some(event))
}

/// Events for a tracking id, oldest first.
pub async fn list(db: &PgPool, tracking_id: &str) -> anyhow::Result<Vec<TrackingEvent>> {
    let rows = sqlx::query_as::<_, TrackingEvent>(
        r#"
        SELECT id, tracking_id, status, location, updated_by, recorded_at
        FROM tracking_events
        WHERE tracking_id = $1
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(tracking_id)
    .fetch_all(db)
    .await
    .context("list tracking events")?;
    Ok(rows)
}
