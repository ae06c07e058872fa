use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    /// When true, HTTP and WebSocket requests resolve to a fixed local
    /// identity instead of verifying bearer tokens.
    pub bypass_auth: bool,

    /// Optional bundled quote dataset, tried before any network source.
    pub quotes_file: Option<PathBuf>,
    pub quotes_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),
            jwt_refresh_ttl_secs: env::var("JWT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "604800".into())
                .parse()
                .expect("JWT_REFRESH_TTL_SECS must be a number"),

            bypass_auth: env::var("BYPASS_AUTH")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),

            quotes_file: env::var("QUOTES_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            quotes_cache_ttl_secs: env::var("QUOTES_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "21600".into()) // 6 hours
                .parse()
                .unwrap_or(21600),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
