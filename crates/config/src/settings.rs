// Application settings
// Loaded from ~/.config/gridmind/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default assist endpoint (a local interpretation service).
const DEFAULT_ENDPOINT: &str = "http://localhost:8000/assist";

/// Default model identifier passed through to the assist service.
const DEFAULT_MODEL: &str = "llama3:8b";

/// Assist request timeouts are kept inside this band: bounded interactive
/// latency matters more than resilience.
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 10;

/// Assist-service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistSettings {
    /// Whether the AI interpretation tier is enabled. When off, every
    /// utterance resolves through the rule tier.
    pub enabled: bool,

    /// Interpretation service URL
    pub endpoint: Option<String>,

    /// Model identifier (service-specific)
    pub model: String,

    /// Request timeout in seconds (clamped to 5-10)
    pub timeout_secs: u64,

    /// Privacy mode: send only typed values, no display text
    pub privacy_mode: bool,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            model: String::new(), // Empty = use default
            timeout_secs: 8,
            privacy_mode: true, // Privacy first
        }
    }
}

impl AssistSettings {
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &self.model
        }
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Display refresh
    #[serde(rename = "feed.refreshIntervalMs")]
    pub refresh_interval_ms: u64,

    // Assist
    #[serde(rename = "assist", default)]
    pub assist: AssistSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            assist: AssistSettings::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridmind");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file();
            return settings;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Parse settings text, tolerating // comment lines
    fn parse(contents: &str) -> Self {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        match serde_json::from_str(&cleaned) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error parsing settings.json: {}", e);
                eprintln!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(&self) {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Display refresh interval for the read-only selection feed
    "feed.refreshIntervalMs": 1000,

    // Assist service (disabled by default)
    // API keys are stored in the system keychain or GRIDMIND_API_KEY,
    // never in this file
    "assist": {
        "enabled": false,
        "endpoint": null,
        "model": "",
        "timeout_secs": 8,
        "privacy_mode": true
    }
}
"#;

        if let Err(e) = fs::write(&path, default_config) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
