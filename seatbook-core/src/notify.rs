use async_trait::async_trait;
use serde::Deserialize;

/// Which transport carries the OTP. The two original backends hard-coded one
/// each (SMS vs email); here it is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Sms,
    Email,
}

/// Outcome of a delivery attempt. The workflow treats `delivered: false` and a
/// transport error identically, so adapters fold their failures into this
/// report instead of surfacing them.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub detail: Option<String>,
}

impl DeliveryReport {
    pub fn delivered() -> Self {
        Self {
            delivered: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            delivered: false,
            detail: Some(detail.into()),
        }
    }
}

/// Fire-and-forget OTP delivery. No retry is performed by the core; a caller
/// that wants a retry re-invokes issue-OTP.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, destination: &str, code: &str) -> DeliveryReport;
}
