use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::Deadlines;
use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};

/// Every problem found while reading the environment, reported together.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid configuration: {}", .0.join("; "))]
pub struct ConfigError(pub Vec<String>);

/// Application configuration loaded from environment variables.
/// Validated once at startup, before the listener binds.
#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub persist_results: bool,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub scoring_api_key: String,
    pub scoring_api_url: String,
    pub scoring_model: String,
    pub fetch_timeout: Duration,
    pub scoring_timeout: Duration,
    pub docx_include_headers_footers: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = EnvReader {
            lookup,
            problems: Vec::new(),
        };

        let persist_results = env.flag("PERSIST_RESULTS", true);
        let database_url = if persist_results {
            Some(env.required("DATABASE_URL"))
        } else {
            env.optional("DATABASE_URL")
        };

        let config = Config {
            database_url,
            persist_results,
            s3_bucket: env.optional("S3_BUCKET").unwrap_or_else(|| "resumes".to_string()),
            s3_endpoint: env.optional("S3_ENDPOINT"),
            s3_region: env.optional("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: env.required("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: env.required("AWS_SECRET_ACCESS_KEY"),
            scoring_api_key: env.required("SCORING_API_KEY"),
            scoring_api_url: env
                .optional("SCORING_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            scoring_model: env
                .optional("SCORING_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fetch_timeout: Duration::from_secs(env.parsed("FETCH_TIMEOUT_SECS", 5u64)),
            scoring_timeout: Duration::from_secs(env.parsed("SCORING_TIMEOUT_SECS", 30u64)),
            docx_include_headers_footers: env.flag("DOCX_INCLUDE_HEADERS_FOOTERS", false),
            port: env.parsed("PORT", 8080u16),
            rust_log: env.optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };

        if config.fetch_timeout.is_zero() || config.scoring_timeout.is_zero() {
            env.problems.push("timeouts must be at least 1 second".to_string());
        }

        if env.problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError(env.problems))
        }
    }

    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            fetch: self.fetch_timeout,
            scoring: self.scoring_timeout,
        }
    }
}

/// Credentials are redacted.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("persist_results", &self.persist_results)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_region", &self.s3_region)
            .field("aws_access_key_id", &"<redacted>")
            .field("aws_secret_access_key", &"<redacted>")
            .field("scoring_api_key", &"<redacted>")
            .field("scoring_api_url", &self.scoring_api_url)
            .field("scoring_model", &self.scoring_model)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("scoring_timeout", &self.scoring_timeout)
            .field("docx_include_headers_footers", &self.docx_include_headers_footers)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

struct EnvReader<F> {
    lookup: F,
    problems: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> String {
        self.optional(key).unwrap_or_else(|| {
            self.problems
                .push(format!("required environment variable '{key}' is not set"));
            String::new()
        })
    }

    fn parsed<T: FromStr>(&mut self, key: &str, default: T) -> T {
        match self.optional(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                self.problems
                    .push(format!("'{key}' has an invalid value '{raw}'"));
                default
            }),
        }
    }

    fn flag(&mut self, key: &str, default: bool) -> bool {
        match self.optional(key).map(|v| v.to_ascii_lowercase()) {
            None => default,
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    self.problems
                        .push(format!("'{key}' must be true or false, got '{v}'"));
                    default
                }
            },
        }
    }
}
