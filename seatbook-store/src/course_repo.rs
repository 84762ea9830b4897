use async_trait::async_trait;
use sqlx::PgPool;

use seatbook_core::course::{Course, NewCourse};
use seatbook_core::repository::CourseRepository;
use seatbook_core::{SeatError, SeatResult};

use crate::store_err;

pub struct PostgresCourseRepository {
    pool: PgPool,
}

impl PostgresCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    course_name: String,
    branch: String,
    institute_name: String,
    city: String,
    total_seats: i32,
    locked_seats: i32,
    left_seats: i32,
    price_per_seat_cents: i64,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            course_name: row.course_name,
            branch: row.branch,
            institute_name: row.institute_name,
            city: row.city,
            total_seats: row.total_seats,
            locked_seats: row.locked_seats,
            left_seats: row.left_seats,
            price_per_seat_cents: row.price_per_seat_cents,
        }
    }
}

#[async_trait]
impl CourseRepository for PostgresCourseRepository {
    async fn insert_course(&self, course: &NewCourse) -> SeatResult<Course> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            INSERT INTO courses (course_name, branch, institute_name, city, total_seats, locked_seats, left_seats, price_per_seat_cents)
            VALUES ($1, $2, $3, $4, $5, 0, $5, $6)
            RETURNING id, course_name, branch, institute_name, city, total_seats, locked_seats, left_seats, price_per_seat_cents
            "#,
        )
        .bind(&course.course_name)
        .bind(&course.branch)
        .bind(&course.institute_name)
        .bind(&course.city)
        .bind(course.total_seats)
        .bind(course.price_per_seat_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.into())
    }

    async fn get_course(&self, course_id: i64) -> SeatResult<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(
            "SELECT id, course_name, branch, institute_name, city, total_seats, locked_seats, left_seats, price_per_seat_cents FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Course::from))
    }

    async fn reserve_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        // The check and the decrement are one statement; two concurrent
        // reservations for the same course are totally ordered by the row
        // update and left_seats can never go negative.
        let left = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE courses
            SET left_seats = left_seats - $2, locked_seats = locked_seats + $2
            WHERE id = $1 AND left_seats >= $2
            RETURNING left_seats
            "#,
        )
        .bind(course_id)
        .bind(count)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match left {
            Some(left) => Ok(left),
            None => {
                // Zero rows: either the course is missing or the seats ran out.
                let current = sqlx::query_scalar::<_, i32>("SELECT left_seats FROM courses WHERE id = $1")
                    .bind(course_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(store_err)?;

                match current {
                    Some(left) => Err(SeatError::InsufficientSeats {
                        course_id,
                        requested: count,
                        left,
                    }),
                    None => Err(SeatError::CourseNotFound(course_id)),
                }
            }
        }
    }

    async fn release_seats(&self, course_id: i64, count: i32) -> SeatResult<i32> {
        let left = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE courses
            SET locked_seats = GREATEST(locked_seats - $2, 0),
                left_seats = LEAST(left_seats + $2, total_seats)
            WHERE id = $1
            RETURNING left_seats
            "#,
        )
        .bind(course_id)
        .bind(count)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        left.ok_or(SeatError::CourseNotFound(course_id))
    }
}
