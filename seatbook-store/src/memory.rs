use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use seatbook_core::billing::{Billing, LineItem, PaymentStatus};
use seatbook_core::course::{Course, NewCourse};
use seatbook_core::pii::Masked;
use seatbook_core::repository::{BillingRepository, CourseRepository, UserRepository};
use seatbook_core::user::{NewUser, User};
use seatbook_core::{SeatError, SeatResult};

/// In-memory store implementing all three repository traits.
///
/// Every operation takes the single mutex for its whole check-and-mutate
/// sequence, which gives it the same atomicity the Postgres adapter gets from
/// conditional UPDATEs. The test suites run against this; it is the executable
/// model of the store contract.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    courses: HashMap<i64, Course>,
    users: HashMap<i64, User>,
    billing: HashMap<i64, Billing>,
    next_course_id: i64,
    next_user_id: i64,
    next_billing_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> SeatResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| SeatError::Store("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert_course(&self, course: &NewCourse) -> SeatResult<Course> {
        let mut inner = self.guard()?;
        inner.next_course_id += 1;
        let row = Course {
            id: inner.next_course_id,
            course_name: course.course_name.clone(),
            branch: course.branch.clone(),
            institute_name: course.institute_name.clone(),
            city: course.city.clone(),
            total_seats: course.total_seats,
            locked_seats: 0,
            left_seats: course.total_seats,
            price_per_seat_cents: course.price_per_seat_cents,
        };
        inner.courses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_course(&self, course_id: i64) -> SeatResult<Option<Course>> {
        Ok(self.guard()?.courses.get(&course_id).cloned())
    }

    async fn reserve_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        let mut inner = self.guard()?;
        let course = inner
            .courses
            .get_mut(&course_id)
            .ok_or(SeatError::CourseNotFound(course_id))?;

        if course.left_seats < count {
            return Err(SeatError::InsufficientSeats {
                course_id,
                requested: count,
                left: course.left_seats,
            });
        }

        course.left_seats -= count;
        course.locked_seats += count;
        Ok(course.left_seats)
    }

    async fn release_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        let mut inner = self.guard()?;
        let course = inner
            .courses
            .get_mut(&course_id)
            .ok_or(SeatError::CourseNotFound(course_id))?;

        course.locked_seats = (course.locked_seats - count).max(0);
        course.left_seats = (course.left_seats + count).min(course.total_seats);
        Ok(course.left_seats)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> SeatResult<User> {
        let mut inner = self.guard()?;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(SeatError::DuplicateEmail(user.email.clone()));
        }
        if inner.users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(SeatError::DuplicatePhone(user.phone_number.clone()));
        }

        inner.next_user_id += 1;
        let row = User {
            id: inner.next_user_id,
            full_name: user.full_name.clone(),
            designation: user.designation.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            company_name: user.company_name.clone(),
            password_hash: user.password_hash.clone(),
            adopted_students: 0,
            role: "user".to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, user_id: i64) -> SeatResult<Option<User>> {
        Ok(self.guard()?.users.get(&user_id).cloned())
    }

    async fn add_adopted_students(&self, user_id: i64, count: i32) -> SeatResult<()> {
        let mut inner = self.guard()?;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(SeatError::UserNotFound(user_id))?;
        user.adopted_students += count;
        Ok(())
    }
}

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn find_open(&self, user_id: i64) -> SeatResult<Option<Billing>> {
        let inner = self.guard()?;
        Ok(inner
            .billing
            .values()
            .find(|b| b.user_id == user_id && b.payment_status.is_open())
            .cloned())
    }

    async fn upsert_open(
        &self,
        user_id: i64,
        items: &[LineItem],
        total_price_cents: i64,
    ) -> SeatResult<Billing> {
        let mut inner = self.guard()?;

        if let Some(existing) = inner
            .billing
            .values_mut()
            .find(|b| b.user_id == user_id && b.payment_status.is_open())
        {
            existing.selected_courses = items.to_vec();
            existing.total_price_cents = total_price_cents;
            return Ok(existing.clone());
        }

        inner.next_billing_id += 1;
        let row = Billing {
            id: inner.next_billing_id,
            user_id,
            selected_courses: items.to_vec(),
            total_price_cents,
            otp: None,
            is_verified: false,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        inner.billing.insert(row.id, row.clone());
        Ok(row)
    }

    async fn store_otp(&self, billing_id: i64, code: &str) -> SeatResult<bool> {
        let mut inner = self.guard()?;
        match inner.billing.get_mut(&billing_id) {
            Some(b)
                if matches!(
                    b.payment_status,
                    PaymentStatus::Pending | PaymentStatus::OtpIssued
                ) =>
            {
                b.otp = Some(Masked(code.to_string()));
                b.is_verified = false;
                b.payment_status = PaymentStatus::OtpIssued;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_verified(&self, billing_id: i64) -> SeatResult<bool> {
        let mut inner = self.guard()?;
        match inner.billing.get_mut(&billing_id) {
            Some(b) if b.payment_status == PaymentStatus::OtpIssued => {
                b.is_verified = true;
                b.payment_status = PaymentStatus::Verified;
                b.otp = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&self, billing_id: i64) -> SeatResult<bool> {
        let mut inner = self.guard()?;
        match inner.billing.get_mut(&billing_id) {
            Some(b) if b.payment_status == PaymentStatus::Verified => {
                b.payment_status = PaymentStatus::Completed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
