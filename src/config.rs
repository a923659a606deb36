use serde::{Deserialize, Serialize};

use crate::models::TimelinePeriod;

const DEFAULT_DB_PATH: &str = "dashboard.db";

/// Application settings, read from the `Rocket.toml` profile or `ROCKET_*` variables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file holding stores, reviews and metric snapshots
    pub database_path: String,
    /// Sentiment window used when a request does not name one
    pub default_period: u8,
    /// Show demo data while a store has nothing recorded
    pub use_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: std::env::var("DASHBOARD_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            default_period: TimelinePeriod::default().months(),
            use_sample_data: true,
        }
    }
}

impl AppConfig {
    /// The configured default window, falling back to six months when out of range
    pub fn default_period(&self) -> TimelinePeriod {
        TimelinePeriod::new(self.default_period).unwrap_or_else(|err| {
            log::warn!("ignoring configured default_period: {}", err);
            TimelinePeriod::default()
        })
    }

    /// Resolve an optional request parameter against the configured default
    pub fn resolve_period(&self, requested: Option<u8>) -> Result<TimelinePeriod, crate::error::AnalyticsError> {
        match requested {
            Some(months) => TimelinePeriod::new(months),
            None => Ok(self.default_period()),
        }
    }
}
