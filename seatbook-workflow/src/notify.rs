//! Console channel adapters for development and testing.
//!
//! Real transports (an SMS gateway, an SMTP relay) live outside the core;
//! these log the code instead of sending it and always report delivery.
//! Printing the code IS the delivery here, so this is the one deliberate
//! exception to the rule that codes never reach the logs in clear. Never
//! wire these adapters into a production configuration.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use seatbook_core::notify::{ChannelKind, DeliveryReport, NotificationChannel};
use seatbook_core::pii::{mask_email, mask_phone};

#[derive(Debug, Clone, Default)]
pub struct ConsoleSmsChannel;

#[async_trait]
impl NotificationChannel for ConsoleSmsChannel {
    async fn send(&self, destination: &str, code: &str) -> DeliveryReport {
        info!(
            to = %mask_phone(destination),
            code,
            "console SMS channel (development mode)"
        );
        DeliveryReport::delivered()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleEmailChannel;

#[async_trait]
impl NotificationChannel for ConsoleEmailChannel {
    async fn send(&self, destination: &str, code: &str) -> DeliveryReport {
        info!(
            to = %mask_email(destination),
            code,
            "console email channel (development mode)"
        );
        DeliveryReport::delivered()
    }
}

/// Console adapter matching the configured channel kind.
pub fn console_channel(kind: ChannelKind) -> Arc<dyn NotificationChannel> {
    match kind {
        ChannelKind::Sms => Arc::new(ConsoleSmsChannel),
        ChannelKind::Email => Arc::new(ConsoleEmailChannel),
    }
}
