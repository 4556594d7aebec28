//! Layered application configuration.
//!
//! Settings resolve in priority order: defaults, then an optional YAML
//! file, then `NUANSWERS_`-prefixed environment variables, then CLI flags.
//! The two secrets the original deployment required — `OPENAI_API_KEY`
//! and `ADMIN_PASSWORD` — are read from the plain environment and are
//! mandatory: startup halts with a clear message when either is missing.

use std::env;
use std::path::Path;

use chrono::Weekday;
use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::llm::LlmSettings;
use crate::schedule::{ScheduleError, TutoringSchedule, Window};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory for the CSV usage logs
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub resilience: ResilienceConfig,
    pub tutoring: TutoringConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub admin_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub timeout_disabled: bool,
    pub requests_per_second: f32,
    pub burst_size: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TutoringConfig {
    /// IANA zone the windows are evaluated in.
    pub timezone: String,
    /// Override windows; the campus defaults apply when absent.
    #[serde(default)]
    pub windows: Option<Vec<WindowSpec>>,
}

/// One configured tutoring window.
#[derive(Debug, Deserialize, Clone)]
pub struct WindowSpec {
    /// Weekday name (`Monday`, `mon`, ...).
    pub day: String,
    /// Start of the window, `HH:MM`.
    pub start: String,
    /// End of the window, `HH:MM`, inclusive.
    pub end: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.data_dir", default_data_dir())?
            .set_default("security.admin_password", "")?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.requests_per_second", 5.0)?
            .set_default("resilience.burst_size", 10.0)?
            .set_default("tutoring.timezone", "America/New_York")?;

        // 2. Config file: explicit path via CLI/CONFIG_FILE, else an
        // optional ./nuanswers.yaml in the working directory.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("nuanswers").required(false));
        }

        // 3. Environment variables prefixed with NUANSWERS_
        // (e.g. NUANSWERS_SERVER__PORT=8000).
        builder = builder.add_source(
            Environment::with_prefix("NUANSWERS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // The admin secret keeps its original un-prefixed name.
        if let Ok(password) = env::var("ADMIN_PASSWORD") {
            builder = builder.set_override("security.admin_password", password)?;
        }

        // 4. CLI flag overrides
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(dir) = cli.data_dir {
            builder = builder.set_override("storage.data_dir", dir)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;

        if cfg.security.admin_password.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "ADMIN_PASSWORD must be set (environment variable or security.admin_password)"
                    .to_string(),
            ));
        }

        Ok(cfg)
    }
}

/// The original deployment wrote under `/data` when the mount existed and
/// fell back to the working directory otherwise.
fn default_data_dir() -> String {
    if Path::new("/data").exists() {
        "/data".to_string()
    } else {
        ".".to_string()
    }
}

/// Build the tutoring schedule from configuration.
pub fn build_schedule(cfg: &TutoringConfig) -> Result<TutoringSchedule, ScheduleError> {
    let tz: Tz = cfg
        .timezone
        .parse()
        .map_err(|_| ScheduleError::BadTimezone(cfg.timezone.clone()))?;

    let Some(specs) = &cfg.windows else {
        return Ok(TutoringSchedule::campus_default_in(tz));
    };

    let mut schedule = TutoringSchedule::new(tz);
    for spec in specs {
        let day: Weekday = spec
            .day
            .parse()
            .map_err(|_| ScheduleError::BadWeekday(spec.day.clone()))?;
        schedule.add_window(day, Window::parse(&spec.start, &spec.end)?);
    }
    Ok(schedule)
}

/// Load LLM settings from the environment.
///
/// `OPENAI_API_KEY` is required; the rest have sensible defaults.
pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let api_key = env::var("OPENAI_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "Missing required env var: OPENAI_API_KEY".to_string())?;

    let base_url = env::var("OPENAI_BASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://api.openai.com".to_string());

    let model = env::var("TUTOR_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "gpt-4.1".to_string());

    let vision_model = env::var("TUTOR_VISION_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "gpt-4o".to_string());

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        vision_model,
    })
}
