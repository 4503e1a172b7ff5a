use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

/// One year. Keeps cookie `Max-Age` and token expiry arithmetic in range.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;
const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub site_title: String,
    /// Offset used for "today" and for stamping new meals.
    pub utc_offset: UtcOffset,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let ttl_minutes = match std::env::var("SESSION_TTL_MINUTES") {
            Ok(raw) => parse_ttl_minutes(&raw).context("invalid SESSION_TTL_MINUTES")?,
            Err(_) => DEFAULT_TTL_MINUTES,
        };
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "food-diary".into()),
            ttl_minutes,
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };
        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw).context("invalid APP_UTC_OFFSET")?,
            Err(_) => UtcOffset::current_local_offset().unwrap_or_else(|_| {
                tracing::warn!("local UTC offset unavailable, using UTC; set APP_UTC_OFFSET");
                UtcOffset::UTC
            }),
        };
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://.meals.db".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "8081".into())
                .parse()
                .context("APP_PORT must be a port number")?,
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()),
            site_title: std::env::var("SITE_TITLE").unwrap_or_else(|_| "Food Diary".into()),
            utc_offset,
            session,
        })
    }

    /// Current wall-clock time in the configured offset.
    pub fn local_now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.utc_offset)
    }
}

pub fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes: i64 = raw.trim().parse().context("not an integer")?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("{minutes} is outside 1..={MAX_TTL_MINUTES}");
    }
    Ok(minutes)
}

/// Accepts `+HH:MM` or `-HH:MM`, e.g. `+08:00`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("expected +HH:MM or -HH:MM, got {raw:?}"))
}
