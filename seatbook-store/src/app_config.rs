use seatbook_core::notify::ChannelKind;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Which transport the workflow hands OTP codes to. The originals hard-coded
/// SMS in one backend and email in the other; here it is a deployment choice.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    pub channel: ChannelKind,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Then the per-environment file, which is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Finally the environment, e.g. SEATBOOK__DATABASE__URL
            .add_source(config::Environment::with_prefix("SEATBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
