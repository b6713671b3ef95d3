//! Process-wide configuration facade.
//!
//! Bundles the watched stores (`config`, `adapter`, `render`), the TTL cache
//! for secondary files and the env file behind one accessor surface.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::cache::{Expiry, TtlCache, DEFAULT_TTL};
use crate::config::env::{read_env_file, write_env_file};
use crate::config::error::ConfigError;
use crate::config::loader::write_json;
use crate::config::paths::ConfigPaths;
use crate::config::schema::{
    AdapterConfig, GroupEntry, Pm2Config, PrivateEntry, RedisConfig, RenderConfig, Section,
};
use crate::config::store::ConfigStore;
use crate::config::validation::lint;

/// All configuration of one bot instance.
#[derive(Debug)]
pub struct Settings {
    paths: ConfigPaths,
    config: Arc<ConfigStore>,
    adapter: Arc<ConfigStore>,
    render: Arc<ConfigStore>,
    files: TtlCache,
}

impl Settings {
    /// Open every watched store. Any failure is fatal to the caller.
    pub fn open(paths: ConfigPaths) -> Result<Self, ConfigError> {
        let open = |section| ConfigStore::open(section, paths.section_file(section)).map(Arc::new);
        let config = open(Section::Config)?;
        let adapter = open(Section::Adapter)?;
        let render = open(Section::Render)?;

        Ok(Self {
            paths,
            config,
            adapter,
            render,
            files: TtlCache::new(),
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Watched stores, for handing to the watcher.
    pub fn stores(&self) -> Vec<Arc<ConfigStore>> {
        vec![self.config.clone(), self.adapter.clone(), self.render.clone()]
    }

    pub fn store(&self, section: Section) -> Option<&Arc<ConfigStore>> {
        match section {
            Section::Config => Some(&self.config),
            Section::Adapter => Some(&self.adapter),
            Section::Render => Some(&self.render),
            _ => None,
        }
    }

    /// Current `config.json` document.
    pub fn config(&self) -> Arc<Value> {
        self.config.get()
    }

    /// Owner accounts.
    pub fn master(&self) -> Vec<String> {
        string_list(&self.config(), "master")
    }

    /// Administrator accounts.
    pub fn admin(&self) -> Vec<String> {
        string_list(&self.config(), "admin")
    }

    pub fn adapter(&self) -> AdapterConfig {
        self.adapter.typed()
    }

    pub fn render(&self) -> RenderConfig {
        self.render.typed()
    }

    pub fn redis(&self) -> RedisConfig {
        self.secondary(Section::Redis)
    }

    pub fn pm2(&self) -> Pm2Config {
        self.secondary(Section::Pm2)
    }

    pub fn groups(&self) -> Vec<GroupEntry> {
        self.secondary_list(Section::Groups)
    }

    pub fn privates(&self) -> Vec<PrivateEntry> {
        self.secondary_list(Section::Privates)
    }

    /// Key/value pairs of the `.env` file.
    pub fn env(&self) -> Arc<Value> {
        self.section(Section::Env, false).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read env file");
            Arc::new(Value::Object(Default::default()))
        })
    }

    /// The bot's `package.json`. Read once per process.
    pub fn pkg(&self) -> Result<Arc<Value>, ConfigError> {
        self.files.read(&self.paths.package_file(), Expiry::Never, false)
    }

    /// Current value of any section.
    ///
    /// Watched sections come from their store; everything else is read through
    /// the TTL cache, bypassed when `refresh` is set.
    pub fn section(&self, section: Section, refresh: bool) -> Result<Arc<Value>, ConfigError> {
        if let Some(store) = self.store(section) {
            return Ok(store.get());
        }

        let path = self.paths.section_file(section);
        let expiry = Expiry::After(DEFAULT_TTL);
        match section {
            Section::Env => self.files.read_with(&path, expiry, refresh, read_env_file),
            _ => {
                let raw = self.files.read(&path, expiry, refresh)?;
                Ok(Arc::new(lint(&section.defaults(), &raw)))
            }
        }
    }

    /// Persist `data` as the new content of `section`.
    ///
    /// Returns `Ok(false)` if the backing file does not exist. Watched stores
    /// pick the change up through the watcher; cached secondary files are
    /// invalidated immediately.
    pub fn set(&self, section: Section, data: &Value) -> Result<bool, ConfigError> {
        if let Some(store) = self.store(section) {
            return store.set(data);
        }

        let path = self.paths.section_file(section);
        let written = match section {
            Section::Env => match data.as_object() {
                Some(vars) => write_env_file(&path, vars)?,
                None => false,
            },
            _ => write_json(&path, data)?,
        };

        if written {
            self.files.invalidate(&path);
            tracing::info!(section = %section, "Config section saved");
        }
        Ok(written)
    }

    fn secondary<T: DeserializeOwned + Default>(&self, section: Section) -> T {
        let value = match self.section(section, false) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(section = %section, error = %e, "Falling back to default config");
                return T::default();
            }
        };

        serde_json::from_value(Value::clone(&value)).unwrap_or_else(|e| {
            tracing::warn!(section = %section, error = %e, "Config does not match typed view");
            T::default()
        })
    }

    /// Entries are taken one by one; an entry that does not fit is skipped
    /// without dropping its neighbours.
    fn secondary_list<T: DeserializeOwned>(&self, section: Section) -> Vec<T> {
        let value = match self.section(section, false) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(section = %section, error = %e, "Falling back to default config");
                return serde_json::from_value(section.defaults()).unwrap_or_default();
            }
        };

        let Some(entries) = value.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(section = %section, index, error = %e, "Skipping invalid entry");
                    None
                }
            })
            .collect()
    }
}

fn string_list(doc: &Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, Settings) {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::new(dir.path());
        paths.seed_defaults().unwrap();
        let settings = Settings::open(paths).unwrap();
        (dir, settings)
    }

    #[test]
    fn test_open_requires_files() {
        let dir = TempDir::new().unwrap();
        let err = Settings::open(ConfigPaths::new(dir.path())).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_accessors_on_defaults() {
        let (_dir, settings) = seeded();
        assert_eq!(settings.master(), vec!["console"]);
        assert!(settings.admin().is_empty());
        assert!(settings.render().ws_server.enable);
        assert_eq!(settings.redis(), RedisConfig::default());
        assert_eq!(settings.groups()[0].key, "default");
        assert_eq!(settings.env()["HTTP_PORT"], "7777");
    }

    #[test]
    fn test_set_secondary_invalidates_cache() {
        let (_dir, settings) = seeded();
        assert_eq!(settings.redis().database, 0);

        let mut redis = Value::clone(&settings.section(Section::Redis, false).unwrap());
        redis["database"] = json!(3);
        assert!(settings.set(Section::Redis, &redis).unwrap());
        assert_eq!(settings.redis().database, 3);
    }

    #[test]
    fn test_set_missing_file_returns_false() {
        let (_dir, settings) = seeded();
        fs::remove_file(settings.paths().section_file(Section::Pm2)).unwrap();
        assert!(!settings.set(Section::Pm2, &json!({})).unwrap());
        assert!(!settings.paths().section_file(Section::Pm2).exists());
        assert_eq!(settings.pm2(), Pm2Config::default());
    }

    #[test]
    fn test_set_watched_section_waits_for_revalidate() {
        let (_dir, settings) = seeded();
        assert!(settings.set(Section::Config, &json!({ "admin": ["7"] })).unwrap());
        assert!(settings.admin().is_empty());

        settings.store(Section::Config).unwrap().revalidate().unwrap();
        assert_eq!(settings.admin(), vec!["7"]);
        assert_eq!(settings.master(), vec!["console"]);
    }

    #[test]
    fn test_section_refresh_bypasses_cache() {
        let (_dir, settings) = seeded();
        settings.section(Section::Privates, false).unwrap();
        fs::write(
            settings.paths().section_file(Section::Privates),
            r#"[{"key":"42","cd":3}]"#,
        )
        .unwrap();

        assert_eq!(settings.section(Section::Privates, false).unwrap()[0]["key"], "default");
        assert_eq!(settings.section(Section::Privates, true).unwrap()[0]["key"], "42");
    }

    #[test]
    fn test_redis_keeps_valid_keys_beside_bad_number() {
        let (_dir, settings) = seeded();
        fs::write(
            settings.paths().section_file(Section::Redis),
            r#"{"url":"redis://prod:6380","database":-1}"#,
        )
        .unwrap();

        let redis = settings.redis();
        assert_eq!(redis.url, "redis://prod:6380");
        assert_eq!(redis.database, 0);
    }

    #[test]
    fn test_adapter_keeps_valid_keys_beside_bad_number() {
        let (_dir, settings) = seeded();
        fs::write(
            settings.paths().section_file(Section::Adapter),
            r#"{"console":{"token":"secret"},"onebot":{"ws_server":{"enable":false,"timeout":1.5}}}"#,
        )
        .unwrap();
        settings.store(Section::Adapter).unwrap().revalidate().unwrap();

        let adapter = settings.adapter();
        assert_eq!(adapter.console.token, "secret");
        assert!(!adapter.onebot.ws_server.enable);
        assert_eq!(adapter.onebot.ws_server.timeout, 120);
    }

    #[test]
    fn test_pm2_large_values_fit() {
        let (_dir, settings) = seeded();
        fs::write(
            settings.paths().section_file(Section::Pm2),
            r#"{"lines":5000000000,"apps":[{"name":"bot","max_restarts":300}]}"#,
        )
        .unwrap();

        let pm2 = settings.pm2();
        assert_eq!(pm2.lines, 5_000_000_000);
        assert_eq!(pm2.apps[0].name, "bot");
        assert_eq!(pm2.apps[0].max_restarts, 300);
    }

    #[test]
    fn test_groups_hand_edited_entries() {
        let (_dir, settings) = seeded();
        fs::write(
            settings.paths().section_file(Section::Groups),
            r#"[{"key":"42","cd":"5","mode":300},"junk",{"key":"43","userCD":2}]"#,
        )
        .unwrap();

        let groups = settings.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "42");
        assert_eq!(groups[0].cd, 5.0);
        assert_eq!(groups[0].mode, 300);
        assert_eq!(groups[1].key, "43");
        assert_eq!(groups[1].user_cd, 2.0);
    }

    #[test]
    fn test_pkg() {
        let (dir, settings) = seeded();
        fs::write(dir.path().join("package.json"), r#"{"name":"bot","version":"1.2.3"}"#).unwrap();
        assert_eq!(settings.pkg().unwrap()["version"], "1.2.3");
    }
}
