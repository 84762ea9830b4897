use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pii::Masked;

/// Reservation lifecycle. Advances forward only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    OtpIssued,
    Verified,
    Completed,
}

impl PaymentStatus {
    /// Open statuses are the ones a `(user, open)` lookup may return;
    /// completed rows are invisible to the workflow.
    pub fn is_open(&self) -> bool {
        !matches!(self, PaymentStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::OtpIssued => "otp_issued",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "otp_issued" => Some(PaymentStatus::OtpIssued),
            "verified" => Some(PaymentStatus::Verified),
            "completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

/// One (course, seat-count) pair within a reservation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub course_id: i64,
    pub seats: i32,
}

/// A user's in-progress or completed purchase (the billing record).
///
/// At most one open row per user exists at a time; the store enforces that.
/// The OTP is wrapped in [`Masked`] so a stray `{:?}` cannot leak it into logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Billing {
    pub id: i64,
    pub user_id: i64,
    pub selected_courses: Vec<LineItem>,
    pub total_price_cents: i64,
    pub otp: Option<Masked<String>>,
    pub is_verified: bool,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Billing {
    /// Exact-match comparison against the stored code. `None` never matches.
    pub fn otp_matches(&self, code: &str) -> bool {
        self.otp.as_ref().map(|stored| stored.0 == code).unwrap_or(false)
    }
}
