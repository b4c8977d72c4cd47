use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedPortal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the portal API.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// OpenAI-compatible chat completions endpoint used for doctor ranking.
pub const DEFAULT_RANKING_API_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Model requested from the ranking gateway.
pub const DEFAULT_RANKING_MODEL: &str = "google/gemini-2.5-flash";

const DEFAULT_RANKING_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RANKING_TEMPERATURE: f32 = 0.7;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medportal_lib=info,medportal=info,tower_http=warn"
}

/// Get the application data directory
/// ~/MedPortal/ on all platforms; falls back to the working directory
/// when no home directory can be determined (containers, CI).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default database location inside the data directory.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("medportal.db")
}

/// Settings for the external ranking oracle.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Bearer credential. `None` disables the feature (ConfigurationError).
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_RANKING_API_URL.to_string(),
            model: DEFAULT_RANKING_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_RANKING_TIMEOUT_SECS),
            temperature: DEFAULT_RANKING_TEMPERATURE,
        }
    }
}

impl RankingConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Full runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub ranking: RankingConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    /// Unparseable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = get("MEDPORTAL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let bind_addr = parse_or_default("MEDPORTAL_BIND_ADDR", get("MEDPORTAL_BIND_ADDR"), || {
            DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787)))
        });

        let defaults = RankingConfig::default();
        let timeout_secs = parse_or_default(
            "RANKING_TIMEOUT_SECS",
            get("RANKING_TIMEOUT_SECS"),
            || DEFAULT_RANKING_TIMEOUT_SECS,
        );
        let temperature = parse_or_default(
            "RANKING_TEMPERATURE",
            get("RANKING_TEMPERATURE"),
            || DEFAULT_RANKING_TEMPERATURE,
        );

        let ranking = RankingConfig {
            api_key: get("RANKING_API_KEY"),
            api_url: get("RANKING_API_URL").unwrap_or(defaults.api_url),
            model: get("RANKING_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(timeout_secs),
            temperature,
        };

        Self {
            db_path,
            bind_addr,
            ranking,
        }
    }
}

fn parse_or_default<T, D>(key: &str, raw: Option<String>, default: D) -> T
where
    T: std::str::FromStr,
    D: FnOnce() -> T,
{
    match raw {
        None => default(),
        Some(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %value, "Invalid configuration value, using default");
                default()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("MedPortal"));
        assert!(default_db_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8787");
        assert!(config.ranking.api_key.is_none());
        assert!(!config.ranking.is_configured());
        assert_eq!(config.ranking.model, DEFAULT_RANKING_MODEL);
        assert_eq!(config.ranking.timeout, Duration::from_secs(60));
        assert!((config.ranking.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MEDPORTAL_DB_PATH", "/tmp/portal.db"),
            ("MEDPORTAL_BIND_ADDR", "0.0.0.0:9000"),
            ("RANKING_API_KEY", "secret"),
            ("RANKING_MODEL", "other-model"),
            ("RANKING_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/portal.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.ranking.api_key.as_deref(), Some("secret"));
        assert_eq!(config.ranking.model, "other-model");
        assert_eq!(config.ranking.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("RANKING_API_KEY", "   ")]));
        assert!(!config.ranking.is_configured());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("RANKING_TIMEOUT_SECS", "soon"),
            ("MEDPORTAL_BIND_ADDR", "not-an-addr"),
        ]));
        assert_eq!(config.ranking.timeout, Duration::from_secs(60));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }
}
