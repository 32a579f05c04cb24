use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewRider, Rider, RIDER_COLUMNS};
use crate::lifecycle::{RiderApproval, RiderStore, RiderWorkStatus};

/// Insert a pending rider. `None` when the email already applied.
pub async fn create(db: &PgPool, new: &NewRider) -> anyhow::Result<Option<Rider>> {
    let sql = format!(
        r#"
        INSERT INTO riders (name, email, phone, region, district, status, rider_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO NOTHING
        RETURNING {RIDER_COLUMNS}
        "#
    );
    let rider = sqlx::query_as::<_, Rider>(&sql)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.region)
        .bind(&new.district)
        .bind(RiderApproval::Pending)
        .bind(RiderWorkStatus::Available)
        .fetch_optional(db)
        .await
        .context("insert rider")?;
    Ok(rider)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Rider>> {
    let sql = format!("SELECT {RIDER_COLUMNS} FROM riders WHERE id = $1");
    let rider = sqlx::query_as::<_, Rider>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find rider")?;
    Ok(rider)
}

/// Riders whose district equals `district`, ignoring case.
pub async fn list_by_district(db: &PgPool, district: &str) -> anyhow::Result<Vec<Rider>> {
    let sql = format!(
        "SELECT {RIDER_COLUMNS} FROM riders WHERE lower(district) = lower($1) ORDER BY name"
    );
    let rows = sqlx::query_as::<_, Rider>(&sql)
        .bind(district.trim())
        .fetch_all(db)
        .await
        .context("list riders by district")?;
    Ok(rows)
}

pub async fn filter(
    db: &PgPool,
    status: Option<RiderApproval>,
    rider_status: Option<RiderWorkStatus>,
) -> anyhow::Result<Vec<Rider>> {
    let mut qb = filter_query(status, rider_status);
    let rows = qb
        .build_query_as::<Rider>()
        .fetch_all(db)
        .await
        .context("filter riders")?;
    Ok(rows)
}

fn filter_query(
    status: Option<RiderApproval>,
    rider_status: Option<RiderWorkStatus>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {RIDER_COLUMNS} FROM riders WHERE TRUE"));
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(rider_status) = rider_status {
        qb.push(" AND rider_status = ").push_bind(rider_status);
    }
    qb.push(" ORDER BY created_at DESC");
    qb
}

pub async fn set_approval(
    db: &PgPool,
    id: Uuid,
    status: RiderApproval,
) -> anyhow::Result<Option<Rider>> {
    let sql = format!("UPDATE riders SET status = $1 WHERE id = $2 RETURNING {RIDER_COLUMNS}");
    let rider = sqlx::query_as::<_, Rider>(&sql)
        .bind(status)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("update rider approval")?;
    Ok(rider)
}

/// [`RiderStore`] over the `riders` table.
#[derive(Clone)]
pub struct PgRiderStore {
    db: PgPool,
}

impl PgRiderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RiderStore for PgRiderStore {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Rider>> {
        find(&self.db, id).await
    }

    async fn set_work_status(&self, id: Uuid, status: RiderWorkStatus) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE riders SET rider_status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.db)
            .await
            .context("update rider work status")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_binds_only_given_fields() {
        let qb = filter_query(None, Some(RiderWorkStatus::Available));
        assert!(qb.sql().ends_with("WHERE TRUE AND rider_status = $1 ORDER BY created_at DESC"));

        let qb = filter_query(Some(RiderApproval::Accepted), Some(RiderWorkStatus::Available));
        assert!(qb
            .sql()
            .ends_with("WHERE TRUE AND status = $1 AND rider_status = $2 ORDER BY created_at DESC"));
    }
}
