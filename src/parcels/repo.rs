use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewParcel, Parcel, PARCEL_COLUMNS};
use crate::db::like_pattern;
use crate::lifecycle::{
    CashoutAllFilter, CashoutStatus, DeliveryStamp, DeliveryStatus, ParcelStore, ParcelUpdate, PaymentStatus,
    PlannedWrite, Precondition,
};

/// Filters for the parcel listing. Built per request.
#[derive(Debug, Clone, Default)]
pub struct ParcelFilter {
    pub created_by: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub search: Option<String>,
}

impl ParcelFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(email) = &self.created_by {
            qb.push(" AND created_by = ").push_bind(email.clone());
        }
        if let Some(status) = self.payment_status {
            qb.push(" AND payment_status = ").push_bind(status);
        }
        if let Some(status) = self.delivery_status {
            qb.push(" AND delivery_status = ").push_bind(status);
        }
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            qb.push(" AND (");
            {
                let mut columns = qb.separated(" OR ");
                for column in ["title", "sender_name", "receiver_name", "tracking_id"] {
                    columns.push(column);
                    columns.push_unseparated(" ILIKE ");
                    columns.push_bind_unseparated(pattern.clone());
                }
            }
            qb.push(")");
        }
    }
}

pub async fn insert(db: &PgPool, new: &NewParcel) -> anyhow::Result<Parcel> {
    let sql = format!(
        r#"
        INSERT INTO parcels (
            tracking_id, title, parcel_type, created_by,
            sender_name, sender_region, sender_district, sender_address, sender_phone,
            receiver_name, receiver_region, receiver_district, receiver_address, receiver_phone,
            cost
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {PARCEL_COLUMNS}
        "#
    );
    let parcel = sqlx::query_as::<_, Parcel>(&sql)
        .bind(&new.tracking_id)
        .bind(&new.title)
        .bind(&new.parcel_type)
        .bind(&new.created_by)
        .bind(&new.sender_name)
        .bind(&new.sender_region)
        .bind(&new.sender_district)
        .bind(&new.sender_address)
        .bind(&new.sender_phone)
        .bind(&new.receiver_name)
        .bind(&new.receiver_region)
        .bind(&new.receiver_district)
        .bind(&new.receiver_address)
        .bind(&new.receiver_phone)
        .bind(new.cost)
        .fetch_one(db)
        .await
        .context("insert parcel")?;
    Ok(parcel)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Parcel>> {
    let sql = format!("SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1");
    let parcel = sqlx::query_as::<_, Parcel>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find parcel")?;
    Ok(parcel)
}

pub async fn list(db: &PgPool, filter: &ParcelFilter) -> anyhow::Result<Vec<Parcel>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PARCEL_COLUMNS} FROM parcels"));
    filter.push_where(&mut qb);
    qb.push(" ORDER BY created_at DESC");
    let rows = qb
        .build_query_as::<Parcel>()
        .fetch_all(db)
        .await
        .context("list parcels")?;
    Ok(rows)
}

/// Parcels currently assigned to a rider, most recently assigned first.
pub async fn list_for_rider(db: &PgPool, rider_email: &str) -> anyhow::Result<Vec<Parcel>> {
    let sql = format!(
        r#"
        SELECT {PARCEL_COLUMNS} FROM parcels
        WHERE assigned_rider AND rider_email = $1
        ORDER BY assigned_at DESC NULLS LAST
        "#
    );
    let rows = sqlx::query_as::<_, Parcel>(&sql)
        .bind(rider_email)
        .fetch_all(db)
        .await
        .context("list rider parcels")?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM parcels WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete parcel")?;
    Ok(result.rows_affected())
}

fn push_update(qb: &mut QueryBuilder<'_, Postgres>, update: &ParcelUpdate) {
    match update.clone() {
        ParcelUpdate::AssignRider {
            rider_id,
            rider_name,
            rider_email,
            rider_status,
            delivery_status,
            assigned_rider,
            assigned_at,
        } => {
            let mut set = qb.separated(", ");
            set.push("rider_id = ").push_bind_unseparated(rider_id);
            set.push("rider_name = ").push_bind_unseparated(rider_name);
            set.push("rider_email = ").push_bind_unseparated(rider_email);
            set.push("rider_status = ").push_bind_unseparated(rider_status);
            set.push("delivery_status = ").push_bind_unseparated(delivery_status);
            set.push("assigned_rider = ").push_bind_unseparated(assigned_rider);
            set.push("assigned_at = ").push_bind_unseparated(assigned_at);
        }
        ParcelUpdate::Delivery {
            delivery_status,
            stamp,
            clear_delivered_at,
        } => {
            qb.push("delivery_status = ").push_bind(delivery_status);
            if clear_delivered_at {
                qb.push(", delivered_at = NULL");
            }
            match stamp {
                DeliveryStamp::PickedAt(at) => qb.push(", picked_at = ").push_bind(at),
                DeliveryStamp::DeliveredAt(at) => qb.push(", delivered_at = ").push_bind(at),
            };
        }
        ParcelUpdate::Cashout {
            cashout_status,
            cashout_at,
        } => {
            qb.push("cashout_status = ")
                .push_bind(cashout_status)
                .push(", cashout_at = ")
                .push_bind(cashout_at);
        }
    }
}

fn push_precondition(qb: &mut QueryBuilder<'_, Postgres>, precondition: Precondition) {
    match precondition {
        Precondition::NotDelivered => {
            qb.push(" AND delivery_status <> ")
                .push_bind(DeliveryStatus::Delivered);
        }
        Precondition::DeliveryIs {
            status,
            rider_assigned,
        } => {
            qb.push(" AND delivery_status = ").push_bind(status);
            qb.push(" AND cashout_status = ")
                .push_bind(CashoutStatus::NotCashed);
            if rider_assigned {
                qb.push(
                    " AND assigned_rider AND rider_id IS NOT NULL \
                     AND btrim(coalesce(rider_name, '')) <> '' \
                     AND btrim(coalesce(rider_email, '')) <> ''",
                );
            }
        }
        Precondition::Cashable => {
            qb.push(" AND delivery_status = ")
                .push_bind(DeliveryStatus::Delivered)
                .push(" AND cashout_status = ")
                .push_bind(CashoutStatus::NotCashed);
        }
    }
}

/// Bulk cashout over the parcels selected by [`CashoutAllFilter`].
fn cashout_all_query(
    filter: &CashoutAllFilter<'_>,
    at: OffsetDateTime,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE parcels SET cashout_status = ");
    qb.push_bind(CashoutStatus::CashedOut)
        .push(", cashout_at = ")
        .push_bind(at)
        .push(" WHERE rider_email = ")
        .push_bind(filter.rider_email.to_string())
        .push(" AND delivery_status = ")
        .push_bind(CashoutAllFilter::DELIVERY)
        .push(" AND cashout_status = ")
        .push_bind(CashoutAllFilter::PENDING);
    qb
}

fn conditional_update_query(id: Uuid, write: &PlannedWrite) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE parcels SET ");
    push_update(&mut qb, &write.update);
    qb.push(" WHERE id = ").push_bind(id);
    push_precondition(&mut qb, write.precondition);
    qb
}

/// [`ParcelStore`] over the `parcels` table.
#[derive(Clone)]
pub struct PgParcelStore {
    db: PgPool,
}

impl PgParcelStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ParcelStore for PgParcelStore {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Parcel>> {
        find(&self.db, id).await
    }

    async fn conditional_update(&self, id: Uuid, write: &PlannedWrite) -> anyhow::Result<u64> {
        let mut qb = conditional_update_query(id, write);
        let result = qb
            .build()
            .execute(&self.db)
            .await
            .context("conditional parcel update")?;
        Ok(result.rows_affected())
    }

    async fn cashout_all(&self, rider_email: &str, at: OffsetDateTime) -> anyhow::Result<u64> {
        let mut qb = cashout_all_query(&CashoutAllFilter { rider_email }, at);
        let result = qb
            .build()
            .execute(&self.db)
            .await
            .context("bulk cashout")?;
        Ok(result.rows_affected())
    }

    async fn count_in_transit_for_rider(&self, rider_id: Uuid) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM parcels WHERE rider_id = $1 AND delivery_status = $2",
        )
        .bind(rider_id)
        .bind(DeliveryStatus::InTransit)
        .fetch_one(&self.db)
        .await
        .context("count rider parcels in transit")?;
        Ok(count)
    }

    async fn list_carried_by(&self, rider_email: &str) -> anyhow::Result<Vec<Parcel>> {
        let sql = format!(
            r#"
            SELECT {PARCEL_COLUMNS} FROM parcels
            WHERE rider_email = $1 AND (delivery_status = $2 OR delivery_status = $3)
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, Parcel>(&sql)
            .bind(rider_email)
            .bind(DeliveryStatus::Delivered)
            .bind(DeliveryStatus::InTransit)
            .fetch_all(&self.db)
            .await
            .context("list rider deliveries")?;
        Ok(rows)
    }
}
