use async_trait::async_trait;

use crate::billing::{Billing, LineItem};
use crate::course::{Course, NewCourse};
use crate::user::{NewUser, User};
use crate::SeatResult;

/// Repository trait for course rows and their seat counters.
///
/// `reserve_seats` and `release_seats` are the only mutation paths for seat
/// counts and must be a single indivisible check-and-update against the store;
/// a separate read followed by a separate write is a race under concurrent
/// reservations.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Seed/admin insertion; `left_seats` starts at `total_seats`.
    async fn insert_course(&self, course: &NewCourse) -> SeatResult<Course>;

    async fn get_course(&self, course_id: i64) -> SeatResult<Option<Course>>;

    /// Atomically checks `left_seats >= count` and decrements it (incrementing
    /// `locked_seats` in the same step). Returns the new `left_seats`.
    /// Fails with `InsufficientSeats` or `CourseNotFound`.
    async fn reserve_seats(&self, course_id: i64, count: i32) -> SeatResult<i32>;

    /// Atomically gives `count` seats back, capped so `left_seats` never
    /// exceeds `total_seats`. Returns the new `left_seats`.
    async fn release_seats(&self, course_id: i64, count: i32) -> SeatResult<i32>;
}

/// Repository trait for user rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail`/`DuplicatePhone` on unique-field conflicts.
    async fn create_user(&self, user: &NewUser) -> SeatResult<User>;

    async fn get_user(&self, user_id: i64) -> SeatResult<Option<User>>;

    /// Atomic increment of the cumulative adopted-students counter.
    async fn add_adopted_students(&self, user_id: i64, count: i32) -> SeatResult<()>;
}

/// Repository trait for billing (reservation) rows.
///
/// "Open" means any status other than completed; the store guarantees at most
/// one open row per user, so a racing double submit cannot create two. The
/// conditional transitions report whether they applied instead of partially
/// writing.
#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn find_open(&self, user_id: i64) -> SeatResult<Option<Billing>>;

    /// Get-or-create the open row for `user_id`, overwriting its line items
    /// and total price either way. A fresh row starts at `pending`.
    async fn upsert_open(
        &self,
        user_id: i64,
        items: &[LineItem],
        total_price_cents: i64,
    ) -> SeatResult<Billing>;

    /// `pending | otp_issued -> otp_issued`, storing a newly issued code and
    /// invalidating any earlier one. Returns whether the transition applied;
    /// verified and completed rows refuse it, so a racing verify can never be
    /// knocked back.
    async fn store_otp(&self, billing_id: i64, code: &str) -> SeatResult<bool>;

    /// `otp_issued -> verified`, clearing the consumed code. Returns whether
    /// the transition applied.
    async fn mark_verified(&self, billing_id: i64) -> SeatResult<bool>;

    /// `verified -> completed`. Returns whether the transition applied.
    async fn mark_completed(&self, billing_id: i64) -> SeatResult<bool>;
}
