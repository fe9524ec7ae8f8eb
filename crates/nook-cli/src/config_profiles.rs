//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nook_core::config::{SyncSettings, DEFAULT_SYNC_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Locally generated identity used when no token is supplied
    #[serde(default)]
    pub guest_id: Option<String>,
    /// Owner of the bearer token passed with `--token` / `NOOK_TOKEN`
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Shared directory synced as a document store when no API URL is set
    #[serde(default)]
    pub sync_dir: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

/// `NOOK_CONFIG_PATH`, else `<config dir>/nook/cli-config.json`
pub fn default_config_path() -> PathBuf {
    if let Some(path) = trimmed_non_empty(std::env::var("NOOK_CONFIG_PATH").ok().as_deref()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nook")
        .join(CONFIG_FILE_NAME)
}

/// Trimmed text, or `None` when absent or blank
pub fn trimmed_non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

pub fn generate_guest_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl CliProfilesConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with_env(explicit, std::env::var("NOOK_PROFILE").ok().as_deref())
    }

    fn resolve_profile_name_with_env(&self, explicit: Option<&str>, env: Option<&str>) -> String {
        trimmed_non_empty(explicit)
            .or_else(|| trimmed_non_empty(env))
            .or_else(|| trimmed_non_empty(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = trimmed_non_empty(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Give the profile a guest id if it has none. Returns true when one was generated.
    pub fn ensure_guest_id(&mut self) -> bool {
        if trimmed_non_empty(self.guest_id.as_deref()).is_some() {
            return false;
        }
        self.guest_id = Some(generate_guest_id());
        true
    }

    /// Sync settings, with `env_api_base_url` (from `NOOK_API_BASE_URL`) taking precedence.
    pub fn sync_settings(&self, env_api_base_url: Option<String>) -> SyncSettings {
        SyncSettings {
            api_base_url: trimmed_non_empty(env_api_base_url.as_deref())
                .or_else(|| trimmed_non_empty(self.api_base_url.as_deref())),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_SYNC_TIMEOUT_SECS),
        }
    }

    fn normalize(&mut self) {
        self.api_base_url = trimmed_non_empty(self.api_base_url.as_deref())
            .map(|url| url.trim_end_matches('/').to_string());
        self.guest_id = trimmed_non_empty(self.guest_id.as_deref());
        self.user_id = trimmed_non_empty(self.user_id.as_deref());
        self.sync_dir = trimmed_non_empty(self.sync_dir.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_config_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliProfilesConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CliProfilesConfig::default());
    }

    #[test]
    fn save_and_load_normalizes_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some("  work ".to_string()),
            ..CliProfilesConfig::default()
        };
        let profile = config.profile_mut_or_default("work");
        profile.api_base_url = Some(" http://localhost:3001/api/ ".to_string());
        profile.user_id = Some("  ".to_string());
        config.save_to_path(&path).unwrap();

        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.active_profile.as_deref(), Some("work"));
        let profile = loaded.profile("work").unwrap();
        assert_eq!(profile.api_base_url.as_deref(), Some("http://localhost:3001/api"));
        assert_eq!(profile.user_id, None);
        assert_eq!(profile.sync_dir, None);
    }

    #[test]
    fn trimmed_non_empty_drops_blank_values() {
        assert_eq!(trimmed_non_empty(None), None);
        assert_eq!(trimmed_non_empty(Some("   ")), None);
        assert_eq!(trimmed_non_empty(Some(" work ")), Some("work".to_string()));
    }

    #[test]
    fn profile_name_precedence() {
        let config = CliProfilesConfig {
            active_profile: Some("active".to_string()),
            ..CliProfilesConfig::default()
        };
        assert_eq!(config.resolve_profile_name_with_env(Some("flag"), Some("env")), "flag");
        assert_eq!(config.resolve_profile_name_with_env(None, Some("env")), "env");
        assert_eq!(config.resolve_profile_name_with_env(None, None), "active");
        assert_eq!(
            CliProfilesConfig::default().resolve_profile_name_with_env(Some(" "), None),
            "default"
        );
    }

    #[test]
    fn ensure_guest_id_generates_once() {
        let mut profile = CliProfile::default();
        assert!(profile.ensure_guest_id());
        let guest_id = profile.guest_id.clone().unwrap();
        assert_eq!(guest_id.len(), 32);
        assert!(guest_id.chars().all(|ch| ch.is_ascii_hexdigit()));

        assert!(!profile.ensure_guest_id());
        assert_eq!(profile.guest_id, Some(guest_id));
    }

    #[test]
    fn env_base_url_overrides_profile() {
        let profile = CliProfile {
            api_base_url: Some("http://profile.test/api".to_string()),
            timeout_secs: Some(5),
            ..CliProfile::default()
        };

        let settings = profile.sync_settings(Some("http://env.test/api".to_string()));
        assert_eq!(settings.api_base_url.as_deref(), Some("http://env.test/api"));
        assert_eq!(settings.timeout_secs, 5);

        let settings = profile.sync_settings(Some("  ".to_string()));
        assert_eq!(settings.api_base_url.as_deref(), Some("http://profile.test/api"));
    }
}
