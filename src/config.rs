use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at start-up
/// and shared immutably through the application state (see `FromRef` in lib.rs).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie defaults.
    pub env: Env,
    // SQLite connection string, e.g. `sqlite://seagro.db?mode=rwc`.
    pub db_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Sessions expire after this many minutes without a request.
    pub session_ttl_minutes: i64,
    // Sets the `Secure` attribute on the session cookie.
    pub session_secure_cookie: bool,
    // Allowed CORS origins; `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

/// Env
///
/// Runtime context: `Local` for development, `Production` for hardened deployments.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_DB_URL: &str = "sqlite://seagro.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5001";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: in-memory database, insecure cookies.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            session_secure_cookie: false,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first).
    ///
    /// # Panics
    /// Panics in `Production` when `DATABASE_URL` is not set, and whenever a
    /// numeric or boolean variable cannot be parsed. The process should not
    /// start with a configuration it cannot honour.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = match env {
            Env::Production => {
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL must be set in production.")
            }
            Env::Local => env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string()),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .map(|v| {
                v.parse::<i64>()
                    .expect("FATAL: SESSION_TTL_MINUTES must be an integer.")
            })
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);

        // Secure cookies by default only where TLS is expected.
        let session_secure_cookie = env::var("SESSION_SECURE_COOKIE")
            .map(|v| {
                v.parse::<bool>()
                    .expect("FATAL: SESSION_SECURE_COOKIE must be true or false.")
            })
            .unwrap_or(env == Env::Production);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Self {
            env,
            db_url,
            bind_addr,
            session_ttl_minutes,
            session_secure_cookie,
            cors_allowed_origins,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
