use rand::Rng;

pub const OTP_DIGITS: usize = 6;

/// Source of one-time passcodes. Swapped for a fixed generator in tests.
pub trait OtpGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random 6-digit code. Leading zeros are valid and a collision
/// with an earlier code is permitted; the newest code is the only live one.
#[derive(Debug, Default)]
pub struct RandomOtp;

impl OtpGenerator for RandomOtp {
    fn generate(&self) -> String {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{n:06}")
    }
}
