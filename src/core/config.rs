//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.parley/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::RenderSettings;
use crate::stream::StreamSettings;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub profile: Option<String>,
}

/// One integration target. Built-in names can be overridden field by field.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileEntry {
    pub name: String,
    pub base_url: Option<String>,
    pub ask_path: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StreamConfig {
    pub tick_ms: Option<u64>,
    pub render_throttle_ms: Option<u64>,
    pub input_scroll_every: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RenderConfig {
    pub markdown: Option<bool>,
    pub highlight: Option<bool>,
    pub theme: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScrollConfig {
    pub input_settle_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MessagesConfig {
    pub transport_error: Option<String>,
    pub unknown_error: Option<String>,
    pub status_error: Option<String>,
    pub empty_answer: Option<String>,
    pub truncated_notice: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PROFILE: &str = "chat";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_INPUT_SETTLE_MS: u64 = 150;

const BUILTIN_PROFILES: &[(&str, &str)] = &[("ask", "/api/ask"), ("chat", "/api/chat/ask")];

pub const DEFAULT_TRANSPORT_ERROR: &str = "Something went wrong while sending the request.";
pub const DEFAULT_UNKNOWN_ERROR: &str = "Unknown error";
/// `{status}` is replaced with the HTTP status code.
pub const DEFAULT_STATUS_ERROR: &str = "Request failed (status {status})";
pub const DEFAULT_EMPTY_ANSWER: &str = "(No response.)";
pub const DEFAULT_TRUNCATED_NOTICE: &str = "answer truncated";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

/// User-visible fixed texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Messages {
    pub transport_error: String,
    pub unknown_error: String,
    /// Non-2xx reply without an `error` or `detail` field.
    pub status_error: String,
    pub empty_answer: String,
    pub truncated_notice: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            transport_error: DEFAULT_TRANSPORT_ERROR.to_string(),
            unknown_error: DEFAULT_UNKNOWN_ERROR.to_string(),
            status_error: DEFAULT_STATUS_ERROR.to_string(),
            empty_answer: DEFAULT_EMPTY_ANSWER.to_string(),
            truncated_notice: DEFAULT_TRUNCATED_NOTICE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub profile: String,
    pub base_url: String,
    pub ask_path: String,
    pub stream: StreamSettings,
    pub render: RenderSettings,
    pub input_settle: Duration,
    pub messages: Messages,
}

/// Values taken from command-line flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub profile: Option<String>,
    pub base_url: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.parley/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".parley").join("config.toml"))
}

/// Load config from `~/.parley/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ParleyConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ParleyConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ParleyConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ParleyConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ParleyConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ParleyConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Parley Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# profile = "chat"                   # Or set PARLEY_PROFILE / pass --profile

# Built-in profiles: "ask" → /api/ask, "chat" → /api/chat/ask
# [[profiles]]
# name = "chat"
# base_url = "http://localhost:8000" # Or set PARLEY_BASE_URL / pass --base-url
# ask_path = "/api/chat/ask"         # Or set PARLEY_ASK_PATH

# [stream]
# tick_ms = 20                       # One character per tick
# render_throttle_ms = 50            # Minimum gap between partial renders
# input_scroll_every = 10            # Keep the input in view every N chars

# [render]
# markdown = true
# highlight = true
# theme = "base16-ocean.dark"

# [scroll]
# input_settle_ms = 150

# [messages]
# transport_error = "Something went wrong while sending the request."
# unknown_error = "Unknown error"
# status_error = "Request failed (status {status})"
# empty_answer = "(No response.)"
# truncated_notice = "answer truncated"
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Drops a zero setting so the default applies instead.
fn positive<T: Copy + Default + PartialEq>(value: Option<T>, key: &str) -> Option<T> {
    match value {
        Some(v) if v == T::default() => {
            warn!("Ignoring {} = 0, using the default", key);
            None
        }
        other => other,
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ParleyConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env(
    config: &ParleyConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Profile: CLI → env → config → default
    let profile = cli
        .profile
        .clone()
        .or_else(|| env("PARLEY_PROFILE"))
        .or_else(|| config.general.profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let entry = config.profiles.iter().find(|p| p.name == profile);
    let builtin_path = BUILTIN_PROFILES
        .iter()
        .find(|(name, _)| *name == profile)
        .map(|(_, path)| path.to_string());
    if entry.is_none() && builtin_path.is_none() {
        warn!("Unknown profile '{}', using built-in paths", profile);
    }

    // Base URL: CLI → env → profile → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("PARLEY_BASE_URL"))
        .or_else(|| entry.and_then(|p| p.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Ask path: env → profile → built-in → built-in default profile
    let ask_path = env("PARLEY_ASK_PATH")
        .or_else(|| entry.and_then(|p| p.ask_path.clone()))
        .or(builtin_path)
        .unwrap_or_else(|| builtin_ask_path(DEFAULT_PROFILE).to_string());

    let stream_defaults = StreamSettings::default();
    let stream = StreamSettings {
        tick: positive(config.stream.tick_ms, "stream.tick_ms")
            .map(Duration::from_millis)
            .unwrap_or(stream_defaults.tick),
        render_throttle: config
            .stream
            .render_throttle_ms
            .map(Duration::from_millis)
            .unwrap_or(stream_defaults.render_throttle),
        input_scroll_every: positive(config.stream.input_scroll_every, "stream.input_scroll_every")
            .unwrap_or(stream_defaults.input_scroll_every),
    };

    let render_defaults = RenderSettings::default();
    let render = RenderSettings {
        markdown: config.render.markdown.unwrap_or(render_defaults.markdown),
        highlight: config.render.highlight.unwrap_or(render_defaults.highlight),
        theme: config.render.theme.clone().unwrap_or(render_defaults.theme),
    };

    let defaults = Messages::default();
    let msgs = &config.messages;
    let messages = Messages {
        transport_error: msgs.transport_error.clone().unwrap_or(defaults.transport_error),
        unknown_error: msgs.unknown_error.clone().unwrap_or(defaults.unknown_error),
        status_error: msgs.status_error.clone().unwrap_or(defaults.status_error),
        empty_answer: msgs.empty_answer.clone().unwrap_or(defaults.empty_answer),
        truncated_notice: msgs.truncated_notice.clone().unwrap_or(defaults.truncated_notice),
    };

    ResolvedConfig {
        profile,
        base_url,
        ask_path,
        stream,
        render,
        input_settle: Duration::from_millis(
            config
                .scroll
                .input_settle_ms
                .unwrap_or(DEFAULT_INPUT_SETTLE_MS),
        ),
        messages,
    }
}

fn builtin_ask_path(profile: &str) -> &'static str {
    BUILTIN_PROFILES
        .iter()
        .find(|(name, _)| *name == profile)
        .map(|(_, path)| *path)
        .unwrap_or("/api/chat/ask")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ParleyConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.profile, DEFAULT_PROFILE);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.ask_path, "/api/chat/ask");
        assert_eq!(resolved.stream, StreamSettings::default());
        assert_eq!(resolved.render, RenderSettings::default());
        assert_eq!(resolved.input_settle, Duration::from_millis(150));
        assert_eq!(resolved.messages, Messages::default());
    }

    #[test]
    fn test_builtin_ask_profile() {
        let config = ParleyConfig {
            general: GeneralConfig {
                profile: Some("ask".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.ask_path, "/api/ask");
    }

    #[test]
    fn test_custom_profile_overrides_builtin() {
        let toml_str = r#"
[general]
profile = "staging"

[[profiles]]
name = "staging"
base_url = "https://staging.example.com"
ask_path = "/v2/ask"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.profile, "staging");
        assert_eq!(resolved.base_url, "https://staging.example.com");
        assert_eq!(resolved.ask_path, "/v2/ask");
    }

    #[test]
    fn test_env_overrides_config_and_cli_overrides_env() {
        let env: HashMap<&str, &str> = [
            ("PARLEY_PROFILE", "ask"),
            ("PARLEY_BASE_URL", "http://env:1"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let config = ParleyConfig {
            general: GeneralConfig {
                profile: Some("chat".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), lookup);
        assert_eq!(resolved.profile, "ask");
        assert_eq!(resolved.base_url, "http://env:1");

        let cli = CliOverrides {
            profile: Some("chat".to_string()),
            base_url: Some("http://cli:2".to_string()),
        };
        let resolved = resolve_with_env(&config, &cli, lookup);
        assert_eq!(resolved.profile, "chat");
        assert_eq!(resolved.base_url, "http://cli:2");
        assert_eq!(resolved.ask_path, "/api/chat/ask");
    }

    #[test]
    fn test_unknown_profile_uses_default_path() {
        let cli = CliOverrides {
            profile: Some("nope".to_string()),
            base_url: None,
        };
        let resolved = resolve_with_env(&ParleyConfig::default(), &cli, no_env);
        assert_eq!(resolved.ask_path, "/api/chat/ask");
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[stream]
tick_ms = 5

[messages]
empty_answer = "nothing"
status_error = "HTTP {status}"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.stream.tick, Duration::from_millis(5));
        assert_eq!(resolved.stream.render_throttle, Duration::from_millis(50));
        assert_eq!(resolved.messages.empty_answer, "nothing");
        assert_eq!(resolved.messages.status_error, "HTTP {status}");
        assert_eq!(resolved.messages.unknown_error, DEFAULT_UNKNOWN_ERROR);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_zero_stream_settings_fall_back_to_defaults() {
        let toml_str = r#"
[stream]
tick_ms = 0
render_throttle_ms = 0
input_scroll_every = 0
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        let defaults = StreamSettings::default();
        assert_eq!(resolved.stream.tick, defaults.tick);
        assert_eq!(resolved.stream.input_scroll_every, defaults.input_scroll_every);
        // A zero throttle is valid: every tick renders.
        assert_eq!(resolved.stream.render_throttle, Duration::ZERO);
    }

    #[test]
    fn test_generated_default_is_all_comments() {
        let config: ParleyConfig = toml::from_str(DEFAULT_CONFIG_CONTENT).unwrap();
        assert!(config.general.profile.is_none());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("parley-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[stream\ntick_ms = ").unwrap();
        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
