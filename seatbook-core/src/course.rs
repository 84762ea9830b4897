use serde::{Deserialize, Serialize};

/// One bookable program/branch/city combination.
///
/// Seat counts obey `left_seats = total_seats - locked_seats` with both sides
/// non-negative; the store is the only place allowed to mutate them, through
/// the atomic primitives on `CourseRepository`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub course_name: String,
    pub branch: String,
    pub institute_name: String,
    pub city: String,
    pub total_seats: i32,
    pub locked_seats: i32,
    pub left_seats: i32,
    pub price_per_seat_cents: i64,
}

impl Course {
    pub fn seats_consistent(&self) -> bool {
        self.left_seats >= 0
            && self.locked_seats >= 0
            && self.left_seats == self.total_seats - self.locked_seats
    }
}

/// Seed payload for a course row; `left_seats` is derived, never supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub course_name: String,
    pub branch: String,
    pub institute_name: String,
    pub city: String,
    pub total_seats: i32,
    pub price_per_seat_cents: i64,
}
