//! Configuration schema definitions.
//!
//! Every section has a typed default. The typed structs are serialized into
//! `serde_json::Value` to form the default schema that user documents are
//! linted against, so the JSON shape on disk is exactly the shape below.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::config::validation::coerce_number;

/// Named configuration sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Config,
    Adapter,
    Render,
    Pm2,
    Redis,
    Groups,
    Privates,
    Env,
}

impl Section {
    /// All sections backed by a JSON file in the config directory.
    pub const JSON_FILES: [Section; 7] = [
        Section::Config,
        Section::Adapter,
        Section::Render,
        Section::Pm2,
        Section::Redis,
        Section::Groups,
        Section::Privates,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Config => "config",
            Section::Adapter => "adapter",
            Section::Render => "render",
            Section::Pm2 => "pm2",
            Section::Redis => "redis",
            Section::Groups => "groups",
            Section::Privates => "privates",
            Section::Env => "env",
        }
    }

    /// File name inside the config directory. `env` lives elsewhere.
    pub fn file_name(self) -> Option<String> {
        match self {
            Section::Env => None,
            other => Some(format!("{}.json", other.name())),
        }
    }

    /// Default document for this section.
    pub fn defaults(self) -> Value {
        let value = match self {
            Section::Config => serde_json::to_value(BotConfig::default()),
            Section::Adapter => serde_json::to_value(AdapterConfig::default()),
            Section::Render => serde_json::to_value(RenderConfig::default()),
            Section::Pm2 => serde_json::to_value(Pm2Config::default()),
            Section::Redis => serde_json::to_value(RedisConfig::default()),
            Section::Groups => serde_json::to_value(vec![GroupEntry::default()]),
            Section::Privates => serde_json::to_value(vec![PrivateEntry::default()]),
            Section::Env => Ok(Value::Object(Default::default())),
        };
        // Plain structs of strings, numbers and vectors always serialize.
        value.unwrap_or(Value::Null)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config" => Ok(Section::Config),
            "adapter" => Ok(Section::Adapter),
            "render" => Ok(Section::Render),
            "pm2" => Ok(Section::Pm2),
            "redis" => Ok(Section::Redis),
            "groups" => Ok(Section::Groups),
            "privates" => Ok(Section::Privates),
            "env" => Ok(Section::Env),
            other => Err(format!("unknown config type: {}", other)),
        }
    }
}

/// Root bot configuration (`config.json`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Owner accounts.
    pub master: Vec<String>,

    /// Administrator accounts.
    pub admin: Vec<String>,

    /// Global user filter.
    pub user: FilterList,

    /// Friend message handling.
    pub friend: ScopeConfig,

    /// Group message handling.
    pub group: ScopeConfig,

    /// Private (temporary) session handling.
    pub private: ScopeConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            master: vec!["console".to_string()],
            admin: Vec::new(),
            user: FilterList::default(),
            friend: ScopeConfig::default(),
            group: ScopeConfig::default(),
            private: ScopeConfig::default(),
        }
    }
}

/// Allow/deny list pair.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FilterList {
    pub enable_list: Vec<String>,
    pub disable_list: Vec<String>,
}

/// Per-scene switch with its own filter lists.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScopeConfig {
    pub enable: bool,
    /// Reply sent when the scene is disabled. Empty means silent.
    pub tips: String,
    pub enable_list: Vec<String>,
    pub disable_list: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            enable: true,
            tips: String::new(),
            enable_list: Vec::new(),
            disable_list: Vec::new(),
        }
    }
}

/// Remote render configuration (`render.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Reverse WebSocket endpoint that renderers connect to.
    pub ws_server: Toggle,

    /// Renderers this process dials out to.
    pub ws_client: Vec<Value>,

    /// HTTP renderers.
    pub http_server: Vec<Value>,
}

/// A bare enable switch.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Toggle {
    pub enable: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enable: true }
    }
}

/// Protocol adapter configuration (`adapter.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdapterConfig {
    pub console: ConsoleAdapter,
    pub onebot: OneBotAdapter,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConsoleAdapter {
    /// Serve console media from the local filesystem.
    pub is_local: bool,
    pub token: String,
    pub host: String,
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self {
            is_local: true,
            token: String::new(),
            host: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OneBotAdapter {
    pub ws_server: OneBotServer,
    pub ws_client: Vec<Value>,
    pub http_server: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OneBotServer {
    pub enable: bool,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for OneBotServer {
    fn default() -> Self {
        Self {
            enable: true,
            timeout: 120,
        }
    }
}

/// Redis connection settings (`redis.json`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            username: String::new(),
            password: String::new(),
            database: 0,
        }
    }
}

/// Process manager settings (`pm2.json`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Pm2Config {
    /// Lines of log history shown by the log viewer.
    pub lines: u64,
    pub apps: Vec<Pm2App>,
}

impl Default for Pm2Config {
    fn default() -> Self {
        Self {
            lines: 1000,
            apps: vec![Pm2App::default()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Pm2App {
    pub name: String,
    pub script: String,
    pub autorestart: bool,
    pub max_restarts: u64,
    pub max_memory_restart: String,
    /// Milliseconds between restarts.
    pub restart_delay: u64,
    pub merge_logs: bool,
    pub error_file: String,
    pub out_file: String,
}

impl Default for Pm2App {
    fn default() -> Self {
        Self {
            name: "chatbot".to_string(),
            script: "index.js".to_string(),
            autorestart: true,
            max_restarts: 3,
            max_memory_restart: "1G".to_string(),
            restart_delay: 2000,
            merge_logs: true,
            error_file: "./logs/pm2_error.log".to_string(),
            out_file: "./logs/pm2_out.log".to_string(),
        }
    }
}

/// Per-group overrides (`groups.json` entries).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GroupEntry {
    /// Group id, or `default` for the fallback entry.
    pub key: String,
    /// Group-wide cooldown in seconds.
    #[serde(deserialize_with = "loose_f64")]
    pub cd: f64,
    /// Per-user cooldown in seconds.
    #[serde(rename = "userCD", deserialize_with = "loose_f64")]
    pub user_cd: f64,
    /// Response mode.
    #[serde(deserialize_with = "loose_u64")]
    pub mode: u64,
    pub alias: Vec<String>,
    pub enable: Vec<String>,
    pub disable: Vec<String>,
    #[serde(rename = "memberEnable")]
    pub member_enable: Vec<String>,
    #[serde(rename = "memberDisable")]
    pub member_disable: Vec<String>,
}

impl Default for GroupEntry {
    fn default() -> Self {
        Self {
            key: "default".to_string(),
            cd: 0.0,
            user_cd: 0.0,
            mode: 0,
            alias: Vec::new(),
            enable: Vec::new(),
            disable: Vec::new(),
            member_enable: Vec::new(),
            member_disable: Vec::new(),
        }
    }
}

/// Per-friend overrides (`privates.json` entries).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PrivateEntry {
    pub key: String,
    #[serde(deserialize_with = "loose_f64")]
    pub cd: f64,
    #[serde(deserialize_with = "loose_u64")]
    pub mode: u64,
    pub alias: Vec<String>,
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

impl Default for PrivateEntry {
    fn default() -> Self {
        Self {
            key: "default".to_string(),
            cd: 0.0,
            mode: 0,
            alias: Vec::new(),
            enable: Vec::new(),
            disable: Vec::new(),
        }
    }
}

// Entries of `groups.json` and `privates.json` are edited by hand and by
// loosely typed clients, so their numbers may arrive as strings.
fn loose_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(coerce_number(Some(&value)).as_f64().unwrap_or(0.0))
}

fn loose_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(coerce_number(Some(&value)).as_u64().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_round_trip_names() {
        for section in Section::JSON_FILES {
            assert_eq!(section.name().parse::<Section>().unwrap(), section);
            assert_eq!(section.file_name().unwrap(), format!("{}.json", section));
        }
        assert_eq!("env".parse::<Section>().unwrap(), Section::Env);
        assert!(Section::Env.file_name().is_none());
        assert!("secrets".parse::<Section>().is_err());
    }

    #[test]
    fn test_group_defaults_use_wire_names() {
        let value = Section::Groups.defaults();
        let first = &value[0];
        assert_eq!(first["key"], "default");
        assert!(first.get("userCD").is_some());
        assert!(first.get("memberEnable").is_some());
        assert!(first.get("user_cd").is_none());
    }

    #[test]
    fn test_group_entry_numbers_are_lenient() {
        let entry: GroupEntry = serde_json::from_value(serde_json::json!({
            "key": "42", "cd": "5", "userCD": "0x10", "mode": -1
        }))
        .unwrap();
        assert_eq!(entry.key, "42");
        assert_eq!(entry.cd, 5.0);
        assert_eq!(entry.user_cd, 16.0);
        assert_eq!(entry.mode, 0);

        let entry: PrivateEntry = serde_json::from_value(serde_json::json!({ "cd": 2.5, "mode": "1" })).unwrap();
        assert_eq!(entry.cd, 2.5);
        assert_eq!(entry.mode, 1);
    }

    #[test]
    fn test_config_defaults() {
        let value = Section::Config.defaults();
        assert_eq!(value["master"], serde_json::json!(["console"]));
        assert_eq!(value["group"]["enable"], true);
        assert_eq!(Section::Render.defaults()["ws_server"]["enable"], true);
    }
}
