use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::{db::is_unique_violation, lifecycle::PaymentStatus};

const PAYMENT_COLUMNS: &str =
    "id, parcel_id, payment_intent_id, payer_email, amount, status, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub parcel_id: Uuid,
    pub payment_intent_id: String,
    pub payer_email: String,
    pub amount: Decimal,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub parcel_id: Uuid,
    pub payment_intent_id: String,
    pub payer_email: String,
    pub amount: Decimal,
}

#[derive(Debug)]
pub enum RecordOutcome {
    Recorded(Payment),
    ParcelMissing,
    AlreadyPaid,
    DuplicateIntent,
}

/// Mark the parcel paid and store the payment in one transaction.
/// The parcel flip only applies to unpaid parcels.
pub async fn record(db: &PgPool, new: &NewPayment) -> anyhow::Result<RecordOutcome> {
    let mut tx = db.begin().await.context("begin payment transaction")?;

    let flipped = sqlx::query(
        "UPDATE parcels SET payment_status = $1 WHERE id = $2 AND payment_status = $3",
    )
    .bind(PaymentStatus::Paid)
    .bind(new.parcel_id)
    .bind(PaymentStatus::Unpaid)
    .execute(&mut *tx)
    .await
    .context("mark parcel paid")?;

    if flipped.rows_affected() == 0 {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM parcels WHERE id = $1)")
                .bind(new.parcel_id)
                .fetch_one(&mut *tx)
                .await
                .context("check parcel exists")?;
        tx.rollback().await.context("rollback payment")?;
        return Ok(if exists {
            RecordOutcome::AlreadyPaid
        } else {
            RecordOutcome::ParcelMissing
        });
    }

    let sql = format!(
        r#"
        INSERT INTO payments (parcel_id, payment_intent_id, payer_email, amount, status)
        VALUES ($1, $2, $3, $4, 'success')
        RETURNING {PAYMENT_COLUMNS}
        "#
    );
    let inserted = sqlx::query_as::<_, Payment>(&sql)
        .bind(new.parcel_id)
        .bind(&new.payment_intent_id)
        .bind(&new.payer_email)
        .bind(new.amount)
        .fetch_one(&mut *tx)
        .await
        .context("insert payment");

    match inserted {
        Ok(payment) => {
            tx.commit().await.context("commit payment")?;
            Ok(RecordOutcome::Recorded(payment))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(intent = %new.payment_intent_id, "payment intent already recorded");
            tx.rollback().await.context("rollback payment")?;
            Ok(RecordOutcome::DuplicateIntent)
        }
        Err(e) => Err(e),
    }
}

/// Listing filter, built per request.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub payer_email: Option<String>,
}

impl PaymentFilter {
    fn query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));
        if let Some(email) = &self.payer_email {
            qb.push(" WHERE payer_email = ").push_bind(email.clone());
        }
        qb.push(" ORDER BY created_at DESC");
        qb
    }
}

pub async fn list(db: &PgPool, filter: &PaymentFilter) -> anyhow::Result<Vec<Payment>> {
    let mut qb = filter.query();
    let rows = qb
        .build_query_as::<Payment>()
        .fetch_all(db)
        .await
        .context("list payments")?;
    Ok(rows)
}
