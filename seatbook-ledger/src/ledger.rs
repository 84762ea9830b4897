use std::sync::Arc;

use seatbook_core::billing::LineItem;
use seatbook_core::repository::{CourseRepository, UserRepository};
use seatbook_core::{SeatError, SeatResult};
use tracing::{error, info, warn};

/// Owns per-course seat counts and drives them exclusively through the
/// store's atomic reserve/release primitives.
pub struct SeatLedger {
    courses: Arc<dyn CourseRepository>,
    users: Arc<dyn UserRepository>,
}

impl SeatLedger {
    pub fn new(courses: Arc<dyn CourseRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { courses, users }
    }

    /// Atomically claims `count` seats on one course. Returns the new
    /// remaining count.
    pub async fn reserve_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        if count <= 0 {
            return Err(SeatError::InvalidInput(format!(
                "seat count must be positive, got {count}"
            )));
        }

        let left = self.courses.reserve_seats(course_id, count).await?;
        info!(course_id, count, left, "seats reserved");
        Ok(left)
    }

    /// Gives `count` seats back, capped at the course total. Compensation
    /// path for failed or aborted reservations.
    pub async fn release_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        if count <= 0 {
            return Err(SeatError::InvalidInput(format!(
                "seat count must be positive, got {count}"
            )));
        }

        let left = self.courses.release_seats(course_id, count).await?;
        info!(course_id, count, left, "seats released");
        Ok(left)
    }

    /// Claims seats across all line items as one unit and credits the user's
    /// adopted-students counter with the summed seats.
    ///
    /// All-or-nothing: if any line item fails, every decrement made so far is
    /// released back before the error is returned, so no partial claim is
    /// observable afterwards.
    pub async fn select_courses(&self, user_id: i64, items: &[LineItem]) -> SeatResult<i32> {
        if items.is_empty() {
            return Err(SeatError::InvalidInput("no courses selected".into()));
        }
        if let Some(bad) = items.iter().find(|item| item.seats <= 0) {
            return Err(SeatError::InvalidInput(format!(
                "seat count must be positive, got {} for course {}",
                bad.seats, bad.course_id
            )));
        }

        self.users
            .get_user(user_id)
            .await?
            .ok_or(SeatError::UserNotFound(user_id))?;

        let mut reserved: Vec<LineItem> = Vec::with_capacity(items.len());
        for item in items {
            match self.courses.reserve_seats(item.course_id, item.seats).await {
                Ok(_) => reserved.push(*item),
                Err(err) => {
                    warn!(
                        user_id,
                        course_id = item.course_id,
                        seats = item.seats,
                        kind = err.kind(),
                        "selection failed, releasing already-claimed seats"
                    );
                    self.compensate(&reserved).await;
                    return Err(err);
                }
            }
        }

        let total_students: i32 = items.iter().map(|item| item.seats).sum();
        if let Err(err) = self.users.add_adopted_students(user_id, total_students).await {
            self.compensate(&reserved).await;
            return Err(err);
        }

        info!(user_id, total_students, "courses selected");
        Ok(total_students)
    }

    async fn compensate(&self, reserved: &[LineItem]) {
        for item in reserved {
            if let Err(err) = self.courses.release_seats(item.course_id, item.seats).await {
                // Nothing left to do but flag it; the seats stay locked until
                // an operator intervenes.
                error!(
                    course_id = item.course_id,
                    seats = item.seats,
                    %err,
                    "compensating release failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbook_core::course::NewCourse;
    use seatbook_core::user::NewUser;
    use seatbook_store::MemoryStore;

    fn course(name: &str, total: i32) -> NewCourse {
        NewCourse {
            course_name: name.into(),
            branch: "Computer Science".into(),
            institute_name: "JEC Jabalpur".into(),
            city: "Jabalpur".into(),
            total_seats: total,
            price_per_seat_cents: 149_999,
        }
    }

    fn user(email: &str, phone: &str) -> NewUser {
        NewUser {
            full_name: "Asha Verma".into(),
            designation: "HR Lead".into(),
            email: email.into(),
            phone_number: phone.into(),
            company_name: "Acme Corp".into(),
            password_hash: "argon2id$stub".into(),
        }
    }

    fn ledger(store: &Arc<MemoryStore>) -> SeatLedger {
        SeatLedger::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn reserve_decrements_and_reports_remaining() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c = store.insert_course(&course("B.Tech", 10)).await.unwrap();

        assert_eq!(ledger.reserve_seats(c.id, 4).await.unwrap(), 6);
        assert_eq!(ledger.reserve_seats(c.id, 6).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reserve_rejects_when_not_enough_left() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c = store.insert_course(&course("M.Tech", 3)).await.unwrap();

        let err = ledger.reserve_seats(c.id, 5).await.unwrap_err();
        assert!(matches!(
            err,
            SeatError::InsufficientSeats { requested: 5, left: 3, .. }
        ));

        // The refused request must not have touched the counter.
        let row = store.get_course(c.id).await.unwrap().unwrap();
        assert_eq!(row.left_seats, 3);
    }

    #[tokio::test]
    async fn unknown_course_and_bad_counts_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);

        assert!(matches!(
            ledger.reserve_seats(404, 1).await.unwrap_err(),
            SeatError::CourseNotFound(404)
        ));
        assert!(matches!(
            ledger.reserve_seats(1, 0).await.unwrap_err(),
            SeatError::InvalidInput(_)
        ));
        assert!(matches!(
            ledger.release_seats(1, -2).await.unwrap_err(),
            SeatError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn release_never_exceeds_total() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c = store.insert_course(&course("Diploma", 8)).await.unwrap();

        ledger.reserve_seats(c.id, 2).await.unwrap();
        assert_eq!(ledger.release_seats(c.id, 5).await.unwrap(), 8);

        let row = store.get_course(c.id).await.unwrap().unwrap();
        assert!(row.seats_consistent());
        assert_eq!(row.left_seats, 8);
    }

    #[tokio::test]
    async fn select_courses_credits_adopted_students() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c1 = store.insert_course(&course("B.Tech", 10)).await.unwrap();
        let c2 = store.insert_course(&course("ITI", 10)).await.unwrap();
        let u = store.create_user(&user("a@acme.com", "9876543210")).await.unwrap();

        let total = ledger
            .select_courses(
                u.id,
                &[
                    LineItem { course_id: c1.id, seats: 4 },
                    LineItem { course_id: c2.id, seats: 3 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(total, 7);
        assert_eq!(
            store.get_user(u.id).await.unwrap().unwrap().adopted_students,
            7
        );
        assert_eq!(store.get_course(c1.id).await.unwrap().unwrap().left_seats, 6);
        assert_eq!(store.get_course(c2.id).await.unwrap().unwrap().left_seats, 7);
    }

    #[tokio::test]
    async fn select_courses_is_all_or_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c1 = store.insert_course(&course("B.Tech", 10)).await.unwrap();
        let c2 = store.insert_course(&course("M.Tech", 2)).await.unwrap();
        let c3 = store.insert_course(&course("ITI", 10)).await.unwrap();
        let u = store.create_user(&user("b@acme.com", "9876500000")).await.unwrap();

        let err = ledger
            .select_courses(
                u.id,
                &[
                    LineItem { course_id: c1.id, seats: 5 },
                    LineItem { course_id: c2.id, seats: 3 }, // only 2 left
                    LineItem { course_id: c3.id, seats: 1 },
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SeatError::InsufficientSeats { .. }));

        // Line item 1's decrement must not be observable afterwards.
        assert_eq!(store.get_course(c1.id).await.unwrap().unwrap().left_seats, 10);
        assert_eq!(store.get_course(c2.id).await.unwrap().unwrap().left_seats, 2);
        assert_eq!(store.get_course(c3.id).await.unwrap().unwrap().left_seats, 10);
        assert_eq!(
            store.get_user(u.id).await.unwrap().unwrap().adopted_students,
            0
        );
    }

    #[tokio::test]
    async fn select_courses_requires_a_known_user() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let c = store.insert_course(&course("B.Tech", 10)).await.unwrap();

        let err = ledger
            .select_courses(42, &[LineItem { course_id: c.id, seats: 1 }])
            .await
            .unwrap_err();
        assert!(matches!(err, SeatError::UserNotFound(42)));
        assert_eq!(store.get_course(c.id).await.unwrap().unwrap().left_seats, 10);
    }

    #[tokio::test]
    async fn empty_selection_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(&store);
        let u = store.create_user(&user("c@acme.com", "9876511111")).await.unwrap();

        assert!(matches!(
            ledger.select_courses(u.id, &[]).await.unwrap_err(),
            SeatError::InvalidInput(_)
        ));
    }
}
