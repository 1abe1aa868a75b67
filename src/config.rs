// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::lineup::DEFAULT_SUGGESTION_COUNT;

pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(20);

/// Settings for the generative-text service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API credential. `None` disables the lineup suggestor.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            timeout: DEFAULT_LLM_TIMEOUT,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory served under `/static` (map images etc.).
    pub static_dir: Option<PathBuf>,
    /// Catalog document used when seeding.
    pub seed_file: PathBuf,
    /// Seed the catalog before serving.
    pub seed_on_start: bool,
    pub llm: LlmConfig,
    /// Upper bound on operators suggested per lineup request.
    pub suggestion_count: usize,
    /// Lineup requests allowed per client per hour; 0 disables the limit.
    pub suggestion_rate_limit: usize,
    /// Key rate limits on `X-Forwarded-For` rather than the peer address.
    pub trust_forwarded_for: bool,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:siege_guide.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `STATIC_DIR` - Directory of static assets served under `/static`
    /// - `SEED_FILE` - Catalog JSON (default: `data/catalog.json`)
    /// - `SEED_ON_START` - Set to `true` to seed before serving
    /// - `LLM_API_KEY` - Generative-text API key; unset disables lineup suggestions
    /// - `LLM_MODEL` - Model id (default: `gemini-2.0-flash`)
    /// - `LLM_BASE_URL` - API base URL
    /// - `LLM_TIMEOUT_SECS` - Request timeout in seconds (default: 20)
    /// - `SUGGESTION_COUNT` - Operators per suggestion (default: 3)
    /// - `SUGGESTION_RATE_LIMIT` - Lineup requests per client per hour (default: 30)
    /// - `TRUST_FORWARDED_FOR` - Set to `true` behind a reverse proxy that sets `X-Forwarded-For`
    ///
    /// CLI flags:
    /// - `--seed` - Seed the catalog before serving (same as `SEED_ON_START=true`)
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from CLI args and an environment lookup.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = env("DATABASE_URL")
            .unwrap_or_else(|| "sqlite:siege_guide.db?mode=rwc".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let static_dir = env("STATIC_DIR").map(PathBuf::from);

        let seed_file = env("SEED_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/catalog.json"));

        let flag = |key: &str| {
            env(key)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false)
        };

        let seed_on_start = args.iter().any(|a| a == "--seed") || flag("SEED_ON_START");

        let llm = LlmConfig {
            api_key: env("LLM_API_KEY").filter(|k| !k.trim().is_empty()),
            model: env("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            base_url: env("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            timeout: env("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LLM_TIMEOUT),
        };

        let suggestion_count = env("SUGGESTION_COUNT")
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_SUGGESTION_COUNT);

        let suggestion_rate_limit = env("SUGGESTION_RATE_LIMIT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let trust_forwarded_for = flag("TRUST_FORWARDED_FOR");

        Config {
            database_url,
            port,
            static_dir,
            seed_file,
            seed_on_start,
            llm,
            suggestion_count,
            suggestion_rate_limit,
            trust_forwarded_for,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
