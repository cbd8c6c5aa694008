use gemline_core::util::{DEFAULT_MODEL, DEFAULT_PERSONA, DEFAULT_TIMEZONE};
use gemline_core::{CivilClock, MemoryScope};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const CONFIG_DIR: &str = "gemline";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LineConfig {
    #[serde(default)]
    pub channel_access_token: String,
    #[serde(default)]
    pub channel_secret: String,
    #[serde(default = "LineConfig::default_api_base")]
    pub api_base: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: String::new(),
            channel_secret: String::new(),
            api_base: Self::default_api_base(),
        }
    }
}

impl LineConfig {
    fn default_api_base() -> String {
        "https://api.line.me".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeminiConfig::default_model")]
    pub model: String,
    #[serde(default = "GeminiConfig::default_base_url")]
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: Self::default_model(),
            base_url: Self::default_base_url(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl GeminiConfig {
    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_base_url() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "AssistantConfig::default_persona")]
    pub persona: String,
    #[serde(default = "AssistantConfig::default_timezone")]
    pub timezone: String,
    /// Pause between the activation reply and the greeting push.
    #[serde(default = "AssistantConfig::default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            persona: Self::default_persona(),
            timezone: Self::default_timezone(),
            greeting_delay_ms: Self::default_greeting_delay_ms(),
        }
    }
}

impl AssistantConfig {
    fn default_persona() -> String {
        DEFAULT_PERSONA.to_string()
    }

    fn default_timezone() -> String {
        DEFAULT_TIMEZONE.to_string()
    }

    const fn default_greeting_delay_ms() -> u64 {
        1000
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        dirs::home_dir().map_or_else(
            || "sqlite://gemline.db?mode=rwc".to_string(),
            |home| {
                format!(
                    "sqlite://{}?mode=rwc",
                    home.join(CONFIG_DIR).join("gemline.db").display()
                )
            },
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    #[serde(default)]
    pub scope: MemoryScope,
    /// Retention cap in entries; `0` keeps everything.
    #[serde(default = "MemoryConfig::default_max_entries")]
    pub max_entries: usize,
    /// Replay history as `[timestamp] text` instead of plain text.
    #[serde(default)]
    pub replay_timestamps: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            scope: MemoryScope::default(),
            max_entries: Self::default_max_entries(),
            replay_timestamps: false,
        }
    }
}

impl MemoryConfig {
    const fn default_max_entries() -> usize {
        200
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    const fn default_port() -> u16 {
        5001
    }
}

fn require(settings: &[(&String, &'static str)]) -> Result<(), ConfigError> {
    for &(value, name) in settings {
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(name));
        }
    }
    Ok(())
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    /// Load `~/gemline/config.json` when present, then apply environment
    /// overrides. Call [`Config::validate`] before serving traffic.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            Self::load_from(&config_path)?
        } else {
            info!(
                "No config file at {}, using defaults and environment",
                config_path.display()
            );
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Overlay values found by `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("LINE_CHANNEL_ACCESS_TOKEN") {
            self.line.channel_access_token = v;
        }
        if let Some(v) = non_empty("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = v;
        }
        if let Some(v) = non_empty("GEMINI_API_KEY") {
            self.providers.gemini.api_key = v;
        }
        if let Some(v) = non_empty("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = non_empty("GEMLINE_TIMEZONE") {
            self.assistant.timezone = v;
        }
        if let Some(port) = non_empty("PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
    }

    /// Check every setting the webhook service cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&[
            (&self.line.channel_access_token, "line.channel_access_token"),
            (&self.line.channel_secret, "line.channel_secret"),
            (&self.database.url, "database.url"),
        ])?;
        self.validate_assistant()
    }

    /// Check the settings needed to talk to the model.
    pub fn validate_assistant(&self) -> Result<(), ConfigError> {
        require(&[
            (&self.providers.gemini.api_key, "providers.gemini.api_key"),
            (&self.providers.gemini.model, "providers.gemini.model"),
            (&self.assistant.persona, "assistant.persona"),
        ])?;
        self.civil_clock()?;
        Ok(())
    }

    pub fn civil_clock(&self) -> Result<CivilClock, ConfigError> {
        CivilClock::from_name(&self.assistant.timezone)
            .ok_or_else(|| ConfigError::InvalidTimezone(self.assistant.timezone.clone()))
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "line": {
    "channel_access_token": "your-line-channel-access-token",
    "channel_secret": "your-line-channel-secret"
  },
  "providers": {
    "gemini": {
      "api_key": "your-gemini-api-key",
      "model": "gemini-2.5-flash"
    }
  },
  "assistant": {
    "timezone": "Asia/Taipei",
    "greeting_delay_ms": 1000
  },
  "memory": {
    "scope": "per_user",
    "max_entries": 200,
    "replay_timestamps": false
  },
  "server": {
    "host": "0.0.0.0",
    "port": 5001
  }
}"#;

        std::fs::write(&config_path, config_template)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Fill in the LINE channel token/secret and the Gemini API key");
        println!("      (or export LINE_CHANNEL_ACCESS_TOKEN, LINE_CHANNEL_SECRET, GEMINI_API_KEY)");
        println!("   2. Run 'gemline serve' and point the LINE webhook at it");
        println!();
        println!("🔧 Configuration options:");
        println!("   - memory.scope: per_user or shared");
        println!("   - memory.max_entries: retention cap, 0 keeps everything");
        println!("   - assistant.persona: system instruction sent to the model");
        println!();
        Ok(())
    }
}
