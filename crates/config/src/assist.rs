// Assist configuration and secrets management
//
// API keys are stored securely using:
// 1. System keychain (preferred)
// 2. GRIDMIND_API_KEY environment variable (fallback for CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;
use std::time::Duration;

use crate::settings::AssistSettings;

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "gridmind";

/// Keychain account under which the assist key lives
const KEYCHAIN_ACCOUNT: &str = "assist/api-key";

/// Environment variable fallback
const ENV_KEY: &str = "GRIDMIND_API_KEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the assist API key, if one is configured.
///
/// Checks in order:
/// 1. System keychain
/// 2. GRIDMIND_API_KEY environment variable
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup { key: Some(key), source: KeySource::Keychain };
            }
        }
    }

    if let Ok(key) = env::var(ENV_KEY) {
        if !key.is_empty() {
            return KeyLookup { key: Some(key), source: KeySource::Environment };
        }
    }

    KeyLookup { key: None, source: KeySource::None }
}

/// Store the assist API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), String> {
    Err(format!(
        "Keychain support not enabled. Set {} environment variable instead.",
        ENV_KEY
    ))
}

/// Delete the assist API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved assist configuration (single source of truth)
// ============================================================================

/// Status of the assist configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistStatus {
    /// Assist tier is disabled; every utterance goes to the rule tier
    Disabled,
    /// Configuration is usable
    Ready,
}

impl AssistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// The effective assist configuration, fully resolved from all sources.
/// This is the single source of truth for runtime assist behavior.
#[derive(Debug, Clone)]
pub struct ResolvedAssistConfig {
    pub status: AssistStatus,
    /// Interpretation service URL
    pub endpoint: String,
    /// Model identifier passed through to the service
    pub model: String,
    /// Bounded request timeout
    pub timeout: Duration,
    /// Privacy mode: send typed values only
    pub privacy_mode: bool,
    /// API key (if configured; the service may not need one)
    pub api_key: Option<String>,
    /// Source of the API key
    pub key_source: KeySource,
}

impl ResolvedAssistConfig {
    /// Resolve the effective assist configuration from settings.
    pub fn from_settings(settings: &AssistSettings) -> Self {
        let status = if settings.enabled {
            AssistStatus::Ready
        } else {
            AssistStatus::Disabled
        };

        let lookup = if settings.enabled {
            get_api_key()
        } else {
            KeyLookup { key: None, source: KeySource::None }
        };

        Self {
            status,
            endpoint: settings.effective_endpoint().to_string(),
            model: settings.effective_model().to_string(),
            timeout: Duration::from_secs(settings.effective_timeout_secs()),
            privacy_mode: settings.privacy_mode,
            api_key: lookup.key,
            key_source: lookup.source,
        }
    }

    /// Load settings and resolve in one call (convenience method)
    pub fn load() -> Self {
        let settings = crate::settings::Settings::load();
        Self::from_settings(&settings.assist)
    }
}

// ============================================================================
// Diagnostics (for CLI doctor and debugging)
// ============================================================================

/// Diagnostic information about assist configuration
#[derive(Debug)]
pub struct AssistDiagnostics {
    pub status: AssistStatus,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub privacy_mode: bool,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
}

impl AssistDiagnostics {
    pub fn from_resolved(config: &ResolvedAssistConfig) -> Self {
        Self {
            status: config.status,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout.as_secs(),
            privacy_mode: config.privacy_mode,
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
        }
    }
}

impl std::fmt::Display for AssistDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Assist Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        writeln!(f, "Endpoint:          {}", self.endpoint)?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "Timeout:           {}s", self.timeout_secs)?;
        writeln!(f, "Privacy mode:      {}", if self.privacy_mode { "on" } else { "off" })?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available:{}", if self.keychain_available { "yes" } else { "no" })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_settings_resolve_disabled() {
        let settings = AssistSettings::default();
        let resolved = ResolvedAssistConfig::from_settings(&settings);
        assert_eq!(resolved.status, AssistStatus::Disabled);
        assert!(resolved.api_key.is_none());
        assert!(!resolved.status.is_ready());
    }

    #[test]
    fn test_enabled_settings_resolve_endpoint_and_timeout() {
        let settings = AssistSettings {
            enabled: true,
            endpoint: Some("http://localhost:9999/assist".into()),
            model: "test-model".into(),
            timeout_secs: 3,
            privacy_mode: false,
        };
        let resolved = ResolvedAssistConfig::from_settings(&settings);
        assert!(resolved.status.is_ready());
        assert_eq!(resolved.endpoint, "http://localhost:9999/assist");
        assert_eq!(resolved.model, "test-model");
        // Clamped into the interactive band.
        assert_eq!(resolved.timeout, Duration::from_secs(5));
    }
}
