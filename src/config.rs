use std::env;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// How long a booking session may live without payment.
    pub session_ttl_secs: i64,
    /// Lease length for seat locks and voucher reservations.
    pub hold_ttl_secs: i64,
    /// Payment links never outlive the session, but may be shorter.
    pub payment_link_ttl_secs: i64,
    pub reaper_interval_secs: u64,
    pub payment_provider: String,
    pub webhook_secret: String,
    pub currency: String,
    /// Platform commission, basis points of the discounted total.
    pub commission_rate_bps: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Ok(Self {
            session_ttl_secs: env_i64("SESSION_TTL_SECS", 600),
            hold_ttl_secs: env_i64("HOLD_TTL_SECS", 600),
            payment_link_ttl_secs: env_i64("PAYMENT_LINK_TTL_SECS", 900),
            reaper_interval_secs: env_i64("REAPER_INTERVAL_SECS", 30) as u64,
            payment_provider: env::var("PAYMENT_PROVIDER").unwrap_or_else(|_| "sandbox".into()),
            webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET")
                .unwrap_or_else(|_| "dev-webhook-secret".into()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "VND".into()),
            commission_rate_bps: env_i64("COMMISSION_RATE_BPS", 500),
            database_url,
            host,
            port,
        })
    }

    /// Config with the given database URL and defaults everywhere else.
    /// Integration tests build their state through this.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 3000,
            session_ttl_secs: 600,
            hold_ttl_secs: 600,
            payment_link_ttl_secs: 900,
            reaper_interval_secs: 30,
            payment_provider: "sandbox".into(),
            webhook_secret: "test-webhook-secret".into(),
            currency: "VND".into(),
            commission_rate_bps: 500,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }

    pub fn hold_ttl(&self) -> Duration {
        Duration::seconds(self.hold_ttl_secs)
    }

    pub fn payment_link_ttl(&self) -> Duration {
        Duration::seconds(self.payment_link_ttl_secs)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
