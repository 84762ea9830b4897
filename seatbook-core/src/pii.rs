use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive data that masks its value in Debug output and can be customized for Serialization.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // This wrapper is primarily for preventing accidental leakage in log
        // macros like tracing::info!("{:?}", billing); serialized payloads keep
        // the real value.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Phone number as echoed back after OTP dispatch: `xxxxxx` plus the last
/// four digits. Short numbers are masked entirely.
pub fn mask_phone(phone: &str) -> String {
    if phone.len() < 4 {
        return "x".repeat(phone.len());
    }
    let tail: String = phone.chars().skip(phone.chars().count().saturating_sub(4)).collect();
    format!("xxxxxx{tail}")
}

/// Email with everything past the first character of the local part hidden.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let head = local.chars().next().map(String::from).unwrap_or_default();
            format!("{head}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_inner() {
        let otp = Masked("417203".to_string());
        assert_eq!(format!("{:?}", otp), "********");
        assert_eq!(format!("{}", otp), "********");
        assert_eq!(otp.into_inner(), "417203");
    }

    #[test]
    fn phone_keeps_last_four() {
        assert_eq!(mask_phone("9876543210"), "xxxxxx3210");
        assert_eq!(mask_phone("123"), "xxx");
    }

    #[test]
    fn email_keeps_first_char_and_domain() {
        assert_eq!(mask_email("sponsor@example.com"), "s***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
