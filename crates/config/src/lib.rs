use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "huddle.toml",
    "config/huddle.toml",
    "crates/config/huddle.toml",
    "../huddle.toml",
    "../config/huddle.toml",
    "../crates/config/huddle.toml",
];

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and friendly AI tutor for a student \
collaboration platform. Explain concepts clearly, guide students step by step and help them \
understand rather than simply giving direct answers. Provide explanations at a college level, \
break complex topics into simple steps and encourage understanding, not copying. If a question \
looks like graded homework, give guidance without full solutions. Be supportive and keep \
responses concise unless the student asks for more detail. Use Markdown for formatting.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://huddle.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }
}

/// Settings for the assistant responder.
///
/// ```
/// use huddle_config::OrchestratorConfig;
///
/// let orchestrator = OrchestratorConfig::default();
/// assert_eq!(orchestrator.model, "gpt-4o-mini");
/// assert_eq!(orchestrator.request_timeout_seconds, 30);
/// assert!(orchestrator.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "OrchestratorConfig::default_model")]
    pub model: String,
    #[serde(default = "OrchestratorConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "OrchestratorConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "OrchestratorConfig::default_system_prompt")]
    pub system_prompt: String,
    /// Prior messages sent along with the prompt.
    #[serde(default = "OrchestratorConfig::default_context_turns")]
    pub context_turns: u32,
    /// Reply persisted when the responder fails or times out.
    #[serde(default = "OrchestratorConfig::default_fallback_reply")]
    pub fallback_reply: String,
}

impl OrchestratorConfig {
    fn default_model() -> String {
        "gpt-4o-mini".to_string()
    }

    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    fn default_system_prompt() -> String {
        DEFAULT_SYSTEM_PROMPT.to_string()
    }

    const fn default_context_turns() -> u32 {
        10
    }

    fn default_fallback_reply() -> String {
        "Sorry, I couldn't come up with an answer right now. Please try again in a moment."
            .to_string()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            base_url: Self::default_base_url(),
            api_key: None,
            request_timeout_seconds: Self::default_request_timeout(),
            system_prompt: Self::default_system_prompt(),
            context_turns: Self::default_context_turns(),
            fallback_reply: Self::default_fallback_reply(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Events buffered per live session before deliveries are dropped.
    #[serde(default = "RealtimeConfig::default_session_buffer")]
    pub session_buffer: usize,
}

impl RealtimeConfig {
    const fn default_session_buffer() -> usize {
        64
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            session_buffer: Self::default_session_buffer(),
        }
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use huddle_config::load;
///
/// std::env::remove_var("HUDDLE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "auth.session_ttl_seconds",
            saturating_i64(defaults.auth.session_ttl_seconds),
        )?
        .set_default("orchestrator.model", defaults.orchestrator.model.clone())?
        .set_default("orchestrator.base_url", defaults.orchestrator.base_url.clone())?
        .set_default(
            "orchestrator.request_timeout_seconds",
            saturating_i64(defaults.orchestrator.request_timeout_seconds),
        )?
        .set_default(
            "orchestrator.system_prompt",
            defaults.orchestrator.system_prompt.clone(),
        )?
        .set_default(
            "orchestrator.context_turns",
            i64::from(defaults.orchestrator.context_turns),
        )?
        .set_default(
            "orchestrator.fallback_reply",
            defaults.orchestrator.fallback_reply.clone(),
        )?
        .set_default(
            "realtime.session_buffer",
            saturating_i64(defaults.realtime.session_buffer as u64),
        )?;

    let mut builder = builder;
    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("HUDDLE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via HUDDLE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("HUDDLE").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }
    if config.realtime.session_buffer == 0 {
        config.realtime.session_buffer = 1;
    }

    debug!(
        model = %config.orchestrator.model,
        database = %config.database.url,
        "loaded backend configuration"
    );
    Ok(config)
}
