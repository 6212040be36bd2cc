//! Settings domain types, defaults and validation.
//!
//! Settings are persisted as a single JSON document. Every section uses
//! `#[serde(default)]` so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::paths::{InstallationLayout, SupportedOs};

/// Wait after launch before the first control-channel connect.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Wait between failed control-channel connects.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on control-channel connect attempts per launch.
pub const DEFAULT_MAX_CONNECT_ATTEMPTS: u32 = 10;

/// Default game port, shared by the TCP/UDP endpoints and RCON.
pub const DEFAULT_GAME_PORT: u16 = 30120;

/// Baseline server-data archive.
pub const DEFAULT_DATA_ARCHIVE_URL: &str =
    "https://codeload.github.com/citizenfx/cfx-server-data/zip/master";

/// Complete application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub server: ServerSettings,
    pub update: UpdateSettings,
    pub control: ControlSettings,
}

/// Install, staging and data directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub game_path: String,
    pub updates_path: String,
    pub data_path: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            game_path: "./FiveM/".to_string(),
            updates_path: "./Updates/".to_string(),
            data_path: "./FiveM/server-data/".to_string(),
        }
    }
}

impl PathSettings {
    pub fn layout(&self) -> InstallationLayout {
        InstallationLayout::new(&self.game_path, &self.updates_path, &self.data_path)
    }
}

/// Game server options turned into launch directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Player slot limit (`sv_maxclients`, 1..=32)
    pub max_players: u32,
    /// Keymaster license key (`sv_licenseKey`)
    pub license_key: String,
    /// Allow ScriptHook clients (`sv_scriptHookAllowed`)
    pub script_hook: bool,
    /// Server list name (`sv_hostname`)
    pub hostname: String,
    /// List the server on the master server
    pub announce_server: bool,
    /// Hide player endpoints in external log output
    pub endpoint_privacy: bool,
    pub resources_to_start: Vec<String>,
    /// Comma-separated server list tags
    pub server_tags: String,
    /// Path to a 96x96 PNG; empty disables the directive
    pub server_icon: String,
    pub endpoint_tcp: String,
    pub endpoint_tcp_port: u16,
    pub endpoint_udp: String,
    pub endpoint_udp_port: u16,
    /// Raw `server.cfg` style lines, each passed as `+<line>`
    pub custom_args: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_players: 32,
            license_key: String::new(),
            script_hook: true,
            hostname: "FiveM - by AMP".to_string(),
            announce_server: true,
            endpoint_privacy: true,
            resources_to_start: [
                "sessionmanager",
                "mapmanager",
                "chat",
                "spawnmanager",
                "sessionmanager",
                "fivem",
                "hardcap",
                "rconlog",
                "scoreboard",
                "playernames",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            server_tags: "default".to_string(),
            server_icon: String::new(),
            endpoint_tcp: "0.0.0.0".to_string(),
            endpoint_tcp_port: DEFAULT_GAME_PORT,
            endpoint_udp: "0.0.0.0".to_string(),
            endpoint_udp_port: DEFAULT_GAME_PORT,
            custom_args: vec![
                "add_ace group.admin command allow".to_string(),
                "add_ace group.admin command.quit deny".to_string(),
                "add_principal identifier.steam:110000112345678 group.admin".to_string(),
            ],
        }
    }
}

/// Typed value of a server convar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConVarValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// A `set <key> <value>` tunable derived from the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConVar {
    pub key: &'static str,
    pub value: ConVarValue,
}

impl ServerSettings {
    /// Tunables passed as `+set` directives, in declaration order.
    pub fn convars(&self) -> Vec<ConVar> {
        vec![
            ConVar {
                key: "sv_maxclients",
                value: ConVarValue::Int(i64::from(self.max_players)),
            },
            ConVar {
                key: "sv_licenseKey",
                value: ConVarValue::Str(self.license_key.clone()),
            },
            ConVar {
                key: "sv_scriptHookAllowed",
                value: ConVarValue::Bool(self.script_hook),
            },
            ConVar {
                key: "sv_hostname",
                value: ConVarValue::Str(self.hostname.clone()),
            },
        ]
    }
}

/// Remote distribution endpoints.
///
/// The build index and archive name default to the host platform's
/// artifacts; set them only to mirror or pin a different channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// HTML directory listing of server builds (trailing slash required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
    /// Archive file name inside each build directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_archive: Option<String>,
    pub data_archive_url: String,
    /// Top-level directory inside the data-set archive
    pub data_archive_root: String,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            index_url: None,
            server_archive: None,
            data_archive_url: DEFAULT_DATA_ARCHIVE_URL.to_string(),
            data_archive_root: "cfx-server-data-master".to_string(),
        }
    }
}

impl UpdateSettings {
    pub fn index_url(&self, os: SupportedOs) -> &str {
        self.index_url.as_deref().unwrap_or(os.artifact_index())
    }

    pub fn server_archive(&self, os: SupportedOs) -> &str {
        self.server_archive
            .as_deref()
            .unwrap_or(os.server_archive())
    }

    /// Download URL of a release's server archive.
    pub fn release_url(&self, os: SupportedOs, version_path: &str) -> String {
        format!(
            "{}{}{}",
            self.index_url(os),
            version_path,
            self.server_archive(os)
        )
    }
}

/// Control-channel connection and bootstrap timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub host: String,
    /// RCON port; `None` uses the TCP endpoint port
    pub port: Option<u16>,
    pub settle_delay_ms: u64,
    pub retry_interval_ms: u64,
    pub max_connect_attempts: u32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            settle_delay_ms: duration_ms(DEFAULT_SETTLE_DELAY),
            retry_interval_ms: duration_ms(DEFAULT_RETRY_INTERVAL),
            max_connect_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
        }
    }
}

impl ControlSettings {
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub const fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Effective RCON port.
    pub fn control_port(&self) -> u16 {
        self.control.port.unwrap_or(self.server.endpoint_tcp_port)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        fs::write(path, json).map_err(|e| SettingsError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Settings loading and validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Max players must be between 1 and 32, got {0}")]
    InvalidMaxPlayers(u32),

    #[error("{0} port cannot be 0")]
    InvalidPort(&'static str),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("Max connect attempts must be at least 1")]
    InvalidConnectAttempts,

    #[error("Failed to read settings from {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse settings from {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Failed to write settings to {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let server = &settings.server;

    if !(1..=32).contains(&server.max_players) {
        return Err(SettingsError::InvalidMaxPlayers(server.max_players));
    }

    if server.endpoint_tcp_port == 0 {
        return Err(SettingsError::InvalidPort("TCP endpoint"));
    }
    if server.endpoint_udp_port == 0 {
        return Err(SettingsError::InvalidPort("UDP endpoint"));
    }
    if settings.control.port == Some(0) {
        return Err(SettingsError::InvalidPort("Control channel"));
    }

    let required = [
        ("Game path", &settings.paths.game_path),
        ("Updates path", &settings.paths.updates_path),
        ("Data path", &settings.paths.data_path),
        ("TCP endpoint address", &server.endpoint_tcp),
        ("UDP endpoint address", &server.endpoint_udp),
        ("Data archive URL", &settings.update.data_archive_url),
        ("Control host", &settings.control.host),
    ];
    if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(SettingsError::Empty(name));
    }

    let overrides = [
        ("Index URL", &settings.update.index_url),
        ("Server archive name", &settings.update.server_archive),
    ];
    for (name, value) in overrides {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(SettingsError::Empty(name));
        }
    }

    if settings.control.max_connect_attempts == 0 {
        return Err(SettingsError::InvalidConnectAttempts);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_stock_module() {
        let settings = Settings::default();
        assert_eq!(settings.server.max_players, 32);
        assert_eq!(settings.server.resources_to_start.len(), 10);
        assert_eq!(settings.server.custom_args.len(), 3);
        assert_eq!(settings.paths.game_path, "./FiveM/");
        assert_eq!(settings.control_port(), DEFAULT_GAME_PORT);
        assert_eq!(settings.control.settle_delay(), DEFAULT_SETTLE_DELAY);
        assert_eq!(settings.control.retry_interval(), DEFAULT_RETRY_INTERVAL);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn convars_in_declaration_order() {
        let keys: Vec<&str> = ServerSettings::default()
            .convars()
            .iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(
            keys,
            [
                "sv_maxclients",
                "sv_licenseKey",
                "sv_scriptHookAllowed",
                "sv_hostname"
            ]
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.server.max_players = 0;
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidMaxPlayers(0))
        ));

        let mut settings = Settings::default();
        settings.server.endpoint_udp_port = 0;
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidPort(_))
        ));

        let mut settings = Settings::default();
        settings.paths.updates_path = "  ".to_string();
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Empty("Updates path"))
        ));

        let mut settings = Settings::default();
        settings.control.max_connect_attempts = 0;
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidConnectAttempts)
        ));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fxhost.json");
        fs::write(&path, r#"{ "server": { "hostname": "My Server" } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.server.hostname, "My Server");
        assert_eq!(settings.server.max_players, 32);
        assert_eq!(settings.update, UpdateSettings::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("fxhost.json");

        let mut settings = Settings::default();
        settings.control.port = Some(40120);
        settings.server.server_icon = "icon.png".to_string();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.control_port(), 40120);
    }

    #[test]
    fn load_or_default_without_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&tmp.path().join("missing.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fxhost.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn release_url_follows_platform() {
        let update = UpdateSettings::default();
        assert_eq!(
            update.release_url(SupportedOs::Windows, "2431-abc/"),
            "https://runtime.fivem.net/artifacts/fivem/build_server_windows/master/2431-abc/server.zip"
        );
        assert_eq!(
            update.release_url(SupportedOs::Linux, "2431-abc/"),
            "https://runtime.fivem.net/artifacts/fivem/build_proot_linux/master/2431-abc/fx.tar.xz"
        );
    }

    #[test]
    fn endpoint_overrides_win_over_platform() {
        let update = UpdateSettings {
            index_url: Some("http://mirror/builds/".to_string()),
            server_archive: Some("custom.zip".to_string()),
            ..UpdateSettings::default()
        };
        assert_eq!(
            update.release_url(SupportedOs::Linux, "1-a/"),
            "http://mirror/builds/1-a/custom.zip"
        );

        let json = serde_json::to_string(&UpdateSettings::default()).unwrap();
        assert!(!json.contains("index_url"));
    }

    #[test]
    fn blank_endpoint_override_is_rejected() {
        let mut settings = Settings::default();
        settings.update.index_url = Some("  ".to_string());
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Empty("Index URL"))
        ));
    }
}
