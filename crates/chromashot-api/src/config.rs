//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use chromashot_media::{DEFAULT_ENCODE_TOOL, DEFAULT_EXTRACT_TIMEOUT, DEFAULT_EXTRACT_TOOL};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding transient artifacts
    pub output_dir: PathBuf,
    /// Frame extraction binary
    pub extract_tool: String,
    /// Image encoding binary
    pub encode_tool: String,
    /// Extract stage timeout
    pub extract_timeout: Option<Duration>,
    /// Encode stage timeout
    pub encode_timeout: Option<Duration>,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Age after which unfetched artifacts are swept; `None` disables sweeping
    pub artifact_ttl: Option<Duration>,
    /// Interval between sweeps
    pub sweep_interval: Duration,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            output_dir: PathBuf::from("outputs"),
            extract_tool: DEFAULT_EXTRACT_TOOL.to_string(),
            encode_tool: DEFAULT_ENCODE_TOOL.to_string(),
            extract_timeout: Some(DEFAULT_EXTRACT_TIMEOUT),
            encode_timeout: Some(Duration::from_secs(300)),
            max_body_size: 512 * 1024 * 1024, // 512MB
            artifact_ttl: Some(Duration::from_secs(3600)),
            sweep_interval: Duration::from_secs(300),
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            extract_tool: std::env::var("EXTRACT_TOOL").unwrap_or(defaults.extract_tool),
            encode_tool: std::env::var("ENCODE_TOOL").unwrap_or(defaults.encode_tool),
            extract_timeout: env_secs("EXTRACT_TIMEOUT").unwrap_or(defaults.extract_timeout),
            encode_timeout: env_secs("ENCODE_TIMEOUT").unwrap_or(defaults.encode_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            artifact_ttl: env_secs("ARTIFACT_TTL").unwrap_or(defaults.artifact_ttl),
            sweep_interval: env_parse("SWEEP_INTERVAL")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"))
                .unwrap_or(defaults.metrics_enabled),
        };

        config.with_safe_artifact_ttl()
    }

    /// Longest time a single conversion may keep its input and intermediate
    /// files on disk. `None` when either stage runs without a timeout.
    pub fn max_conversion_time(&self) -> Option<Duration> {
        Some(self.extract_timeout? + self.encode_timeout?)
    }

    /// Raise the artifact TTL so the sweeper never removes files of a
    /// conversion that is still running.
    ///
    /// With an unbounded stage there is no safe TTL, so sweeping is disabled.
    pub fn with_safe_artifact_ttl(mut self) -> Self {
        let Some(ttl) = self.artifact_ttl else {
            return self;
        };

        match self.max_conversion_time() {
            Some(floor) if ttl < floor => {
                warn!(
                    "ARTIFACT_TTL {:?} is shorter than the conversion time limit {:?}, using {:?}",
                    ttl, floor, floor
                );
                self.artifact_ttl = Some(floor);
            }
            Some(_) => {}
            None => {
                warn!("A conversion stage has no timeout, artifact sweeping disabled");
                self.artifact_ttl = None;
            }
        }

        self
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Seconds from the environment; `0` means "no limit".
fn env_secs(key: &str) -> Option<Option<Duration>> {
    env_parse::<u64>(key).map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_service() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.extract_timeout, Some(Duration::from_secs(300)));
        assert!(!config.is_production());
    }

    #[test]
    fn test_env_secs_zero_disables() {
        std::env::set_var("CHROMASHOT_TEST_ZERO_SECS", "0");
        std::env::set_var("CHROMASHOT_TEST_SOME_SECS", "45");

        assert_eq!(env_secs("CHROMASHOT_TEST_ZERO_SECS"), Some(None));
        assert_eq!(
            env_secs("CHROMASHOT_TEST_SOME_SECS"),
            Some(Some(Duration::from_secs(45)))
        );
        assert_eq!(env_secs("CHROMASHOT_TEST_UNSET_SECS"), None);
    }

    #[test]
    fn test_short_ttl_is_raised_to_conversion_limit() {
        let config = ApiConfig {
            extract_timeout: Some(Duration::from_secs(300)),
            encode_timeout: Some(Duration::from_secs(120)),
            artifact_ttl: Some(Duration::from_secs(60)),
            ..ApiConfig::default()
        }
        .with_safe_artifact_ttl();

        assert_eq!(config.artifact_ttl, Some(Duration::from_secs(420)));
    }

    #[test]
    fn test_long_ttl_is_kept() {
        let config = ApiConfig::default().with_safe_artifact_ttl();
        assert_eq!(config.artifact_ttl, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_unbounded_stage_disables_sweeping() {
        let config = ApiConfig {
            encode_timeout: None,
            ..ApiConfig::default()
        }
        .with_safe_artifact_ttl();

        assert_eq!(config.artifact_ttl, None);
    }

    #[test]
    fn test_disabled_ttl_stays_disabled() {
        let config = ApiConfig {
            artifact_ttl: None,
            ..ApiConfig::default()
        }
        .with_safe_artifact_ttl();

        assert_eq!(config.artifact_ttl, None);
    }
}
