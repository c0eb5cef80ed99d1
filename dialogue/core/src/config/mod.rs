//! TOML Configuration File Support
//!
//! Centralized configuration loading for the game, supporting a TOML file at
//! `~/.config/llm-rpg/config.toml`. The result is an immutable [`GameConfig`]
//! built once at startup and passed by reference.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/llm-rpg/config.toml` (typically `~/.config/llm-rpg/config.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [ollama]
//! host = "localhost"
//! port = 11434
//! model = "qwen3:8b"
//! request_timeout_secs = 120
//! temperature = 0.7
//!
//! [dialogue]
//! history_window = 10
//! max_input_chars = 150
//! submit_cooldown_ms = 500
//! wrap_width = 78
//! visible_lines = 10
//!
//! [game]
//! fps = 60
//! show_title = true
//!
//! [[game.obstacles]]
//! x = 560
//! y = 120
//! width = 120
//! height = 60
//!
//! [[npcs]]
//! name = "Colleague 1"
//! kind = "cat"
//! personality = "wise"
//! x = 124
//! y = 217
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::SamplingOptions;
use crate::npc::Personality;
use crate::viewport::{DEFAULT_VISIBLE_LINES, DEFAULT_WRAP_WIDTH};
use crate::world::Rect;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[ollama]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaToml {
    /// Server host
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// Model name
    pub model: Option<String>,
    /// Ceiling for one generation request, in seconds
    pub request_timeout_secs: Option<u64>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold
    pub top_p: Option<f32>,
    /// Repetition penalty
    pub repeat_penalty: Option<f32>,
}

/// `[dialogue]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueToml {
    /// History entries included in each prompt
    pub history_window: Option<usize>,
    /// Input buffer limit in characters
    pub max_input_chars: Option<usize>,
    /// Minimum gap between accepted submits, in milliseconds
    pub submit_cooldown_ms: Option<u64>,
    /// Characters per wrapped line
    pub wrap_width: Option<usize>,
    /// Lines shown at once
    pub visible_lines: Option<usize>,
    /// Cursor blink half-period, in milliseconds
    pub cursor_blink_ms: Option<u64>,
}

/// `[game]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameToml {
    /// Frame rate cap
    pub fps: Option<u32>,
    /// Start on the title screen
    pub show_title: Option<bool>,
    /// Solid furniture (replaces the default layout)
    pub obstacles: Option<Vec<Rect>>,
}

/// One `[[npcs]]` entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NpcToml {
    /// Display name
    pub name: String,
    /// Cosmetic kind
    #[serde(default)]
    pub kind: Option<String>,
    /// Personality name (unknown names fall back to friendly)
    #[serde(default)]
    pub personality: Option<String>,
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfigToml {
    /// Model server section
    pub ollama: OllamaToml,
    /// Dialogue section
    pub dialogue: DialogueToml,
    /// Game loop section
    pub game: GameToml,
    /// NPC roster (replaces the default roster)
    pub npcs: Option<Vec<NpcToml>>,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Model server settings
#[derive(Clone, Debug, PartialEq)]
pub struct OllamaSettings {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Model name sent with every request
    pub model: String,
    /// Ceiling for one generation request
    pub request_timeout: Duration,
    /// Sampling options sent with every request
    pub sampling: SamplingOptions,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            model: "qwen3:8b".to_string(),
            request_timeout: Duration::from_secs(120),
            sampling: SamplingOptions::default(),
        }
    }
}

/// Dialogue behaviour
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogueSettings {
    /// History entries included in each prompt
    pub history_window: usize,
    /// Input buffer limit in characters
    pub max_input_chars: usize,
    /// Minimum gap between accepted submits
    pub submit_cooldown: Duration,
    /// Characters per wrapped line
    pub wrap_width: usize,
    /// Lines shown at once
    pub visible_lines: usize,
    /// Cursor blink half-period
    pub cursor_blink: Duration,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            history_window: 10,
            max_input_chars: 150,
            submit_cooldown: Duration::from_millis(500),
            wrap_width: DEFAULT_WRAP_WIDTH,
            visible_lines: DEFAULT_VISIBLE_LINES,
            cursor_blink: Duration::from_millis(500),
        }
    }
}

/// Game loop and room settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSettings {
    /// Frame rate cap
    pub fps: u32,
    /// Start on the title screen
    pub show_title: bool,
    /// Solid furniture
    pub obstacles: Vec<Rect>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            fps: 60,
            show_title: true,
            obstacles: default_obstacles(),
        }
    }
}

impl GameSettings {
    /// Time budget for one frame
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// One NPC placed in the room
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpcConfig {
    /// Display name
    pub name: String,
    /// Cosmetic kind
    pub kind: String,
    /// Conversational style
    pub personality: Personality,
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

impl NpcConfig {
    /// Create an NPC entry
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        personality: Personality,
        x: i32,
        y: i32,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            personality,
            x,
            y,
        }
    }
}

impl From<&NpcToml> for NpcConfig {
    fn from(toml: &NpcToml) -> Self {
        Self {
            name: toml.name.clone(),
            kind: toml.kind.clone().unwrap_or_else(|| "animal".to_string()),
            personality: toml
                .personality
                .as_deref()
                .map(Personality::from_name)
                .unwrap_or_default(),
            x: toml.x,
            y: toml.y,
        }
    }
}

/// The five colleagues in the default office
#[must_use]
pub fn default_roster() -> Vec<NpcConfig> {
    vec![
        NpcConfig::new("Colleague 1", "cat", Personality::Wise, 124, 217),
        NpcConfig::new("Colleague 2", "rabbit", Personality::Mysterious, 193, 217),
        NpcConfig::new("Colleague 3", "dog", Personality::Friendly, 194, 348),
        NpcConfig::new("GTP", "fox", Personality::Playful, 374, 348),
        NpcConfig::new("Lee Chong Keat", "human", Personality::Programmer, 363, 217),
    ]
}

/// Furniture in the default office
#[must_use]
pub fn default_obstacles() -> Vec<Rect> {
    vec![Rect::new(560, 120, 120, 60), Rect::new(600, 400, 150, 40)]
}

/// Centralized configuration for the game
///
/// Consolidates all configuration from multiple sources and tracks where it
/// came from. Use [`load_config`] to load with proper priority handling.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Model server settings
    pub ollama: OllamaSettings,
    /// Dialogue behaviour
    pub dialogue: DialogueSettings,
    /// Game loop and room
    pub game: GameSettings,
    /// NPC roster
    pub npcs: Vec<NpcConfig>,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Source of configuration values
    source: ConfigSource,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaSettings::default(),
            dialogue: DialogueSettings::default(),
            game: GameSettings::default(),
            npcs: default_roster(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the game cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero_checks = [
            ("dialogue.wrap_width", self.dialogue.wrap_width == 0),
            ("dialogue.visible_lines", self.dialogue.visible_lines == 0),
            ("dialogue.history_window", self.dialogue.history_window == 0),
            ("dialogue.max_input_chars", self.dialogue.max_input_chars == 0),
            ("game.fps", self.game.fps == 0),
            ("ollama.request_timeout_secs", self.ollama.request_timeout.is_zero()),
            ("ollama.port", self.ollama.port == 0),
        ];
        if let Some((field, _)) = zero_checks.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be greater than zero"
            )));
        }

        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama.model must not be empty".to_string(),
            ));
        }
        if let Some(npc) = self.npcs.iter().find(|n| n.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "NPC at ({}, {}) has an empty name",
                npc.x, npc.y
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/llm-rpg/config.toml` or
/// `~/.config/llm-rpg/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("llm-rpg").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// merged configuration fails validation. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<GameConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, reading the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<GameConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the merged configuration fails validation.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<GameConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GameConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: GameConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut GameConfig, toml: &GameConfigToml) {
    // Model server
    if let Some(ref host) = toml.ollama.host {
        config.ollama.host.clone_from(host);
    }
    if let Some(port) = toml.ollama.port {
        config.ollama.port = port;
    }
    if let Some(ref model) = toml.ollama.model {
        config.ollama.model.clone_from(model);
    }
    if let Some(secs) = toml.ollama.request_timeout_secs {
        config.ollama.request_timeout = Duration::from_secs(secs);
    }
    if let Some(temperature) = toml.ollama.temperature {
        config.ollama.sampling.temperature = temperature;
    }
    if let Some(top_p) = toml.ollama.top_p {
        config.ollama.sampling.top_p = top_p;
    }
    if let Some(penalty) = toml.ollama.repeat_penalty {
        config.ollama.sampling.repeat_penalty = penalty;
    }

    // Dialogue
    if let Some(window) = toml.dialogue.history_window {
        config.dialogue.history_window = window;
    }
    if let Some(max) = toml.dialogue.max_input_chars {
        config.dialogue.max_input_chars = max;
    }
    if let Some(ms) = toml.dialogue.submit_cooldown_ms {
        config.dialogue.submit_cooldown = Duration::from_millis(ms);
    }
    if let Some(width) = toml.dialogue.wrap_width {
        config.dialogue.wrap_width = width;
    }
    if let Some(lines) = toml.dialogue.visible_lines {
        config.dialogue.visible_lines = lines;
    }
    if let Some(ms) = toml.dialogue.cursor_blink_ms {
        config.dialogue.cursor_blink = Duration::from_millis(ms);
    }

    // Game loop and room
    if let Some(fps) = toml.game.fps {
        config.game.fps = fps;
    }
    if let Some(show) = toml.game.show_title {
        config.game.show_title = show;
    }
    if let Some(ref obstacles) = toml.game.obstacles {
        config.game.obstacles.clone_from(obstacles);
    }

    if let Some(ref npcs) = toml.npcs {
        config.npcs = npcs.iter().map(NpcConfig::from).collect();
    }
}

/// Parse an environment value, logging (and ignoring) garbage
fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value, "Ignoring unparseable environment variable");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut GameConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("OLLAMA_HOST") {
        config.ollama.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("OLLAMA_PORT").and_then(|v| parse_env("OLLAMA_PORT", &v)) {
        config.ollama.port = port;
        config.source = ConfigSource::Env;
    }
    if let Some(model) = env("LLM_RPG_MODEL") {
        config.ollama.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) =
        env("LLM_RPG_REQUEST_TIMEOUT").and_then(|v| parse_env("LLM_RPG_REQUEST_TIMEOUT", &v))
    {
        config.ollama.request_timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(window) =
        env("LLM_RPG_HISTORY_WINDOW").and_then(|v| parse_env("LLM_RPG_HISTORY_WINDOW", &v))
    {
        config.dialogue.history_window = window;
        config.source = ConfigSource::Env;
    }
    if let Some(width) = env("LLM_RPG_WRAP_WIDTH").and_then(|v| parse_env("LLM_RPG_WRAP_WIDTH", &v))
    {
        config.dialogue.wrap_width = width;
        config.source = ConfigSource::Env;
    }
    if let Some(lines) =
        env("LLM_RPG_VISIBLE_LINES").and_then(|v| parse_env("LLM_RPG_VISIBLE_LINES", &v))
    {
        config.dialogue.visible_lines = lines;
        config.source = ConfigSource::Env;
    }
    if let Some(fps) = env("LLM_RPG_FPS").and_then(|v| parse_env("LLM_RPG_FPS", &v)) {
        config.game.fps = fps;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Server host override
    pub host: Option<String>,
    /// Server port override
    pub port: Option<u16>,
    /// Model override
    pub model: Option<String>,
    /// Request timeout override (seconds)
    pub request_timeout_secs: Option<u64>,
    /// Frame rate override
    pub fps: Option<u32>,
    /// Title screen override
    pub show_title: Option<bool>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Set frame rate override
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set title screen override
    #[must_use]
    pub fn with_show_title(mut self, show: bool) -> Self {
        self.show_title = Some(show);
        self
    }

    fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.model.is_none()
            && self.request_timeout_secs.is_none()
            && self.fps.is_none()
            && self.show_title.is_none()
    }

    /// Apply overrides to a configuration and re-validate it
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override is out of range.
    pub fn apply(&self, config: &mut GameConfig) -> Result<(), ConfigError> {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.host {
            config.ollama.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.ollama.port = port;
        }
        if let Some(ref model) = self.model {
            config.ollama.model.clone_from(model);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.ollama.request_timeout = Duration::from_secs(secs);
        }
        if let Some(fps) = self.fps {
            config.game.fps = fps;
        }
        if let Some(show) = self.show_title {
            config.game.show_title = show;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();

        assert_eq!(config.ollama.host, "localhost");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.ollama.model, "qwen3:8b");
        assert_eq!(config.ollama.request_timeout, Duration::from_secs(120));
        assert_eq!(config.dialogue.history_window, 10);
        assert_eq!(config.dialogue.max_input_chars, 150);
        assert_eq!(config.dialogue.submit_cooldown, Duration::from_millis(500));
        assert_eq!(config.dialogue.wrap_width, 78);
        assert_eq!(config.dialogue.visible_lines, 10);
        assert_eq!(config.game.fps, 60);
        assert_eq!(config.npcs.len(), 5);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_roster() {
        let roster = default_roster();
        let gtp = roster.iter().find(|n| n.name == "GTP").unwrap();
        assert_eq!(gtp.personality, Personality::Playful);
        assert_eq!((gtp.x, gtp.y), (374, 348));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("llm-rpg"));
            assert!(p.to_string_lossy().ends_with("config.toml"));
        }
    }

    #[test]
    fn test_frame_duration() {
        let settings = GameSettings {
            fps: 50,
            ..Default::default()
        };
        assert_eq!(settings.frame_duration(), Duration::from_millis(20));
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[ollama]
host = "gpu-box"
port = 8080
model = "llama3.2"
request_timeout_secs = 30
temperature = 0.2

[dialogue]
history_window = 6
submit_cooldown_ms = 250
wrap_width = 60

[game]
fps = 30
show_title = false

[[game.obstacles]]
x = 10
y = 20
width = 30
height = 40

[[npcs]]
name = "Fox"
kind = "fox"
personality = "playful"
x = 100
y = 200

[[npcs]]
name = "Owl"
personality = "grumpy"
x = 300
y = 200
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.ollama.host, "gpu-box");
        assert_eq!(config.ollama.port, 8080);
        assert_eq!(config.ollama.model, "llama3.2");
        assert_eq!(config.ollama.request_timeout, Duration::from_secs(30));
        assert!((config.ollama.sampling.temperature - 0.2).abs() < f32::EPSILON);
        assert!((config.ollama.sampling.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.dialogue.history_window, 6);
        assert_eq!(config.dialogue.submit_cooldown, Duration::from_millis(250));
        assert_eq!(config.dialogue.wrap_width, 60);
        assert_eq!(config.dialogue.visible_lines, 10);
        assert_eq!(config.game.fps, 30);
        assert!(!config.game.show_title);
        assert_eq!(config.game.obstacles, vec![Rect::new(10, 20, 30, 40)]);

        assert_eq!(config.npcs.len(), 2);
        assert_eq!(config.npcs[0], NpcConfig::new("Fox", "fox", Personality::Playful, 100, 200));
        assert_eq!(config.npcs[1].personality, Personality::Friendly);
        assert_eq!(config.npcs[1].kind, "animal");

        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_parse_empty_toml_keeps_defaults() {
        let file = write_toml("");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.ollama.model, "qwen3:8b");
        assert_eq!(config.npcs, default_roster());
        assert_eq!(config.game.obstacles, default_obstacles());
    }

    // =========================================================================
    // Missing File / Malformed TOML Tests
    // =========================================================================

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[ollama\nport = \"not a number\"\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let file = write_toml("[dialogue]\nwrap_width = \"wide\"\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_zero_values_rejected() {
        for toml in [
            "[dialogue]\nwrap_width = 0\n",
            "[dialogue]\nvisible_lines = 0\n",
            "[dialogue]\nhistory_window = 0\n",
            "[game]\nfps = 0\n",
        ] {
            let file = write_toml(toml);
            let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
            assert!(
                matches!(err, ConfigError::ValidationError(ref m) if m.contains("greater than zero")),
                "{toml}: {err}"
            );
        }
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[ollama]\nmodel = \"from-file\"\nport = 1111\n");
        let env: HashMap<&str, &str> = HashMap::from([
            ("LLM_RPG_MODEL", "from-env"),
            ("OLLAMA_HOST", "10.0.0.2"),
            ("LLM_RPG_WRAP_WIDTH", "40"),
            ("LLM_RPG_FPS", "not-a-number"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        assert_eq!(config.ollama.model, "from-env");
        assert_eq!(config.ollama.host, "10.0.0.2");
        assert_eq!(config.ollama.port, 1111);
        assert_eq!(config.dialogue.wrap_width, 40);
        assert_eq!(config.game.fps, 60);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides_everything() {
        let env = |key: &str| (key == "LLM_RPG_MODEL").then(|| "from-env".to_string());
        let mut config = load_config_with_env(None, env).unwrap();

        ConfigOverrides::new()
            .with_model("from-cli".to_string())
            .with_port(9999)
            .with_show_title(false)
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.ollama.model, "from-cli");
        assert_eq!(config.ollama.port, 9999);
        assert!(!config.game.show_title);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = GameConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_override_validated() {
        let mut config = GameConfig::default();
        let result = ConfigOverrides::new().with_fps(0).apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
