use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub media_root: String,
    pub templates_dir: String,
    pub index_cache_seconds: u64,
    pub session_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into());
        let templates_dir = std::env::var("TEMPLATES_DIR")
            .unwrap_or_else(|_| default_templates_dir().to_string());
        let index_cache_seconds = std::env::var("INDEX_CACHE_SECONDS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid INDEX_CACHE_SECONDS: {}", e))?;
        let session_hours = std::env::var("SESSION_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid SESSION_HOURS: {}", e))?;

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            media_root,
            templates_dir,
            index_cache_seconds,
            session_hours,
        })
    }
}

pub fn default_templates_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/templates")
}
