use crate::config::AppConfig;
use crate::db;
use crate::views::Views;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub views: Arc<Views>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;
        Self::from_parts(db, config)
    }

    pub fn from_parts(db: SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let views = Arc::new(Views::new(config.site_title.clone())?);
        Ok(Self {
            db,
            config: Arc::new(config),
            views,
        })
    }

    /// State backed by a fresh in-memory database.
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        use crate::config::SessionConfig;

        let config = AppConfig {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            static_dir: "static".into(),
            site_title: "Food Diary".into(),
            utc_offset: time::UtcOffset::UTC,
            session: SessionConfig {
                secret: "test".into(),
                issuer: "food-diary".into(),
                ttl_minutes: 5,
                cookie_secure: false,
            },
        };
        Self::from_parts(db::memory().await, config).expect("test state builds")
    }
}
