use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use seatbook_core::billing::{Billing, LineItem, PaymentStatus};
use seatbook_core::pii::Masked;
use seatbook_core::repository::BillingRepository;
use seatbook_core::{SeatError, SeatResult};

use crate::store_err;

pub struct PostgresBillingRepository {
    pool: PgPool,
}

impl PostgresBillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BillingRow {
    id: i64,
    user_id: i64,
    selected_courses: Value,
    total_price_cents: i64,
    otp: Option<String>,
    is_verified: bool,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BillingRow> for Billing {
    type Error = SeatError;

    fn try_from(row: BillingRow) -> Result<Self, Self::Error> {
        let selected_courses: Vec<LineItem> = serde_json::from_value(row.selected_courses)
            .map_err(|e| SeatError::Store(format!("malformed selected_courses JSON: {e}")))?;
        let payment_status = PaymentStatus::parse(&row.payment_status)
            .ok_or_else(|| SeatError::Store(format!("unknown payment status: {}", row.payment_status)))?;

        Ok(Billing {
            id: row.id,
            user_id: row.user_id,
            selected_courses,
            total_price_cents: row.total_price_cents,
            otp: row.otp.map(Masked),
            is_verified: row.is_verified,
            payment_status,
            created_at: row.created_at,
        })
    }
}

const ALL_COLUMNS: &str =
    "id, user_id, selected_courses, total_price_cents, otp, is_verified, payment_status, created_at";

#[async_trait]
impl BillingRepository for PostgresBillingRepository {
    async fn find_open(&self, user_id: i64) -> SeatResult<Option<Billing>> {
        let row = sqlx::query_as::<_, BillingRow>(&format!(
            "SELECT {ALL_COLUMNS} FROM billing WHERE user_id = $1 AND payment_status <> 'completed'"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(Billing::try_from).transpose()
    }

    async fn upsert_open(
        &self,
        user_id: i64,
        items: &[LineItem],
        total_price_cents: i64,
    ) -> SeatResult<Billing> {
        let items_json =
            serde_json::to_value(items).map_err(|e| SeatError::Store(e.to_string()))?;

        // The partial unique index on (user_id) WHERE payment_status <>
        // 'completed' is the arbiter: a racing double submit lands on the same
        // open row instead of creating a second one.
        let row = sqlx::query_as::<_, BillingRow>(&format!(
            r#"
            INSERT INTO billing (user_id, selected_courses, total_price_cents)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) WHERE payment_status <> 'completed'
            DO UPDATE SET selected_courses = EXCLUDED.selected_courses,
                          total_price_cents = EXCLUDED.total_price_cents
            RETURNING {ALL_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(items_json)
        .bind(total_price_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_into()
    }

    async fn store_otp(&self, billing_id: i64, code: &str) -> SeatResult<bool> {
        // Guarded like the other transitions: a row that already advanced to
        // verified (or completed) refuses the new code instead of regressing.
        let result = sqlx::query(
            r#"
            UPDATE billing
            SET otp = $2, is_verified = FALSE, payment_status = 'otp_issued'
            WHERE id = $1 AND payment_status IN ('pending', 'otp_issued')
            "#,
        )
        .bind(billing_id)
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_verified(&self, billing_id: i64) -> SeatResult<bool> {
        // The consumed code is cleared in the same step that flips the status.
        let result = sqlx::query(
            r#"
            UPDATE billing
            SET is_verified = TRUE, payment_status = 'verified', otp = NULL
            WHERE id = $1 AND payment_status = 'otp_issued'
            "#,
        )
        .bind(billing_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&self, billing_id: i64) -> SeatResult<bool> {
        let result = sqlx::query(
            "UPDATE billing SET payment_status = 'completed' WHERE id = $1 AND payment_status = 'verified'",
        )
        .bind(billing_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }
}
