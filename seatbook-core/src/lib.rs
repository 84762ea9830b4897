pub mod billing;
pub mod course;
pub mod notify;
pub mod pii;
pub mod repository;
pub mod user;

/// Error taxonomy shared by the seat ledger and the reservation workflow.
///
/// Every variant maps to a stable machine-readable kind via [`SeatError::kind`];
/// the `Display` message is the human-readable half. Store internals are never
/// exposed beyond the `Store` message string.
#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("course not found: {0}")]
    CourseNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(i64),

    #[error("no pending transaction found for user {user_id}")]
    NoPendingReservation { user_id: i64 },

    #[error("not enough seats available for course {course_id}: requested {requested}, left {left}")]
    InsufficientSeats {
        course_id: i64,
        requested: i32,
        left: i32,
    },

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("phone number already registered: {0}")]
    DuplicatePhone(String),

    #[error("reservation for user {user_id} is already verified; complete the payment first")]
    AlreadyVerified { user_id: i64 },

    #[error("invalid OTP")]
    InvalidOtp,

    #[error("please verify OTP before proceeding with payment")]
    NotVerified,

    #[error("failed to send OTP: {0}")]
    DeliveryFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(String),
}

impl SeatError {
    /// Stable machine-readable error kind for API layers and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatError::CourseNotFound(_)
            | SeatError::UserNotFound(_)
            | SeatError::NoPendingReservation { .. } => "not_found",
            SeatError::InsufficientSeats { .. }
            | SeatError::DuplicateEmail(_)
            | SeatError::DuplicatePhone(_)
            | SeatError::AlreadyVerified { .. } => "conflict",
            SeatError::InvalidOtp | SeatError::InvalidInput(_) => "invalid_input",
            SeatError::NotVerified => "unverified",
            SeatError::DeliveryFailed(_) => "delivery_failed",
            SeatError::Store(_) => "store_error",
        }
    }
}

pub type SeatResult<T> = Result<T, SeatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(SeatError::CourseNotFound(7).kind(), "not_found");
        assert_eq!(
            SeatError::InsufficientSeats {
                course_id: 1,
                requested: 5,
                left: 2
            }
            .kind(),
            "conflict"
        );
        assert_eq!(SeatError::InvalidOtp.kind(), "invalid_input");
        assert_eq!(SeatError::NotVerified.kind(), "unverified");
        assert_eq!(SeatError::DeliveryFailed("timeout".into()).kind(), "delivery_failed");
    }

    #[test]
    fn messages_carry_context() {
        let err = SeatError::InsufficientSeats {
            course_id: 3,
            requested: 7,
            left: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("course 3"));
        assert!(msg.contains("requested 7"));
    }
}
