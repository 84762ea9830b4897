pub mod app_config;
pub mod billing_repo;
pub mod course_repo;
pub mod database;
pub mod memory;
pub mod user_repo;

pub use billing_repo::PostgresBillingRepository;
pub use course_repo::PostgresCourseRepository;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use user_repo::PostgresUserRepository;

use seatbook_core::SeatError;

/// Store-level failures (connection loss, constraint violation) surface as a
/// generic store error; no driver detail leaks past the message string.
pub(crate) fn store_err(err: sqlx::Error) -> SeatError {
    SeatError::Store(err.to_string())
}
