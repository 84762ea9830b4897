pub mod notify;
pub mod otp;
pub mod workflow;

pub use otp::{OtpGenerator, RandomOtp};
pub use workflow::ReservationWorkflow;
