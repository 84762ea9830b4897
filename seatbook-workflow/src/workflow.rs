use std::sync::Arc;

use seatbook_core::billing::{LineItem, PaymentStatus};
use seatbook_core::notify::{ChannelKind, NotificationChannel};
use seatbook_core::pii::{mask_email, mask_phone};
use seatbook_core::repository::{BillingRepository, UserRepository};
use seatbook_core::{SeatError, SeatResult};
use tracing::{info, warn};

use crate::otp::OtpGenerator;

/// Drives a reservation through pending -> otp_issued -> verified ->
/// completed. Owns the OTP lifecycle: a code is persisted only after the
/// channel confirms delivery, is overwritten by a re-issue, and is cleared
/// the moment it is consumed.
pub struct ReservationWorkflow {
    users: Arc<dyn UserRepository>,
    billing: Arc<dyn BillingRepository>,
    channel: Arc<dyn NotificationChannel>,
    channel_kind: ChannelKind,
    otp: Arc<dyn OtpGenerator>,
}

impl ReservationWorkflow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        billing: Arc<dyn BillingRepository>,
        channel: Arc<dyn NotificationChannel>,
        channel_kind: ChannelKind,
        otp: Arc<dyn OtpGenerator>,
    ) -> Self {
        Self {
            users,
            billing,
            channel,
            channel_kind,
            otp,
        }
    }

    /// Generates a code, dispatches it, and only on a delivered report
    /// get-or-creates the user's open reservation with the given line items
    /// and price, stores the code and moves to `otp_issued`. A delivery
    /// failure leaves every record exactly as it was.
    ///
    /// Returns the masked destination the code went to.
    pub async fn issue_otp(
        &self,
        user_id: i64,
        items: &[LineItem],
        total_price_cents: i64,
    ) -> SeatResult<String> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(SeatError::UserNotFound(user_id))?;

        if let Some(open) = self.billing.find_open(user_id).await? {
            // Forward-only status: a verified reservation is waiting on
            // payment, not on another code.
            if open.payment_status == PaymentStatus::Verified {
                return Err(SeatError::AlreadyVerified { user_id });
            }
        }

        let destination = match self.channel_kind {
            ChannelKind::Sms => user.phone_number.as_str(),
            ChannelKind::Email => user.email.as_str(),
        };
        if destination.is_empty() {
            return Err(SeatError::InvalidInput(
                "user has no delivery destination on file".into(),
            ));
        }

        let code = self.otp.generate();
        let report = self.channel.send(destination, &code).await;
        if !report.delivered {
            let detail = report
                .detail
                .unwrap_or_else(|| "channel reported failure".into());
            warn!(user_id, channel = ?self.channel_kind, detail = %detail, "OTP delivery failed");
            return Err(SeatError::DeliveryFailed(detail));
        }

        // Delivery confirmed; only now touch the store. A re-issue lands on
        // the same open row and the new code supersedes the old one.
        let billing = self
            .billing
            .upsert_open(user_id, items, total_price_cents)
            .await?;
        if !self.billing.store_otp(billing.id, &code).await? {
            // A verify landed between the open-row read and the conditional
            // update; the reservation kept its advanced status.
            return Err(SeatError::AlreadyVerified { user_id });
        }

        let masked = match self.channel_kind {
            ChannelKind::Sms => mask_phone(destination),
            ChannelKind::Email => mask_email(destination),
        };
        info!(user_id, billing_id = billing.id, destination = %masked, "OTP issued");
        Ok(masked)
    }

    /// Exact string comparison against the stored code. A match moves the
    /// reservation to `verified` and clears the code; a mismatch changes
    /// nothing and may be retried.
    pub async fn verify_otp(&self, user_id: i64, code: &str) -> SeatResult<()> {
        let billing = self
            .billing
            .find_open(user_id)
            .await?
            .ok_or(SeatError::NoPendingReservation { user_id })?;

        if billing.payment_status != PaymentStatus::OtpIssued || !billing.otp_matches(code) {
            warn!(user_id, billing_id = billing.id, "OTP mismatch");
            return Err(SeatError::InvalidOtp);
        }

        if !self.billing.mark_verified(billing.id).await? {
            // The row moved between the read and the conditional update;
            // nothing was changed, so report it like a mismatch.
            return Err(SeatError::InvalidOtp);
        }

        info!(user_id, billing_id = billing.id, "OTP verified");
        Ok(())
    }

    /// Marks the verified reservation completed and returns its id as the
    /// transaction identifier. Completed rows leave the open lookup, so a
    /// repeat call fails with `NoPendingReservation`.
    pub async fn complete_payment(&self, user_id: i64) -> SeatResult<i64> {
        let billing = self
            .billing
            .find_open(user_id)
            .await?
            .ok_or(SeatError::NoPendingReservation { user_id })?;

        if billing.payment_status != PaymentStatus::Verified {
            return Err(SeatError::NotVerified);
        }

        if !self.billing.mark_completed(billing.id).await? {
            return Err(SeatError::NotVerified);
        }

        info!(user_id, transaction_id = billing.id, "payment completed");
        Ok(billing.id)
    }
}
