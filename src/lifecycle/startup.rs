//! Startup orchestration.
//!
//! # Responsibilities
//! - Export `.env` into the process environment
//! - Seed missing config files from defaults
//! - Open the watched stores
//!
//! # Design Decisions
//! - Fail fast: any error here is fatal
//! - Seeding is the only place files are created; `ConfigStore::open` never does

use crate::config::{env, ConfigError, ConfigPaths, Settings};

/// Prepare the config directory and open every store.
pub fn bootstrap(paths: ConfigPaths) -> Result<Settings, ConfigError> {
    let seeded = paths.seed_defaults()?;
    if !seeded.is_empty() {
        tracing::info!(count = seeded.len(), "Created missing config files from defaults");
    }

    let exported = env::export_env_file(&paths.env_file())?;
    tracing::debug!(count = exported, "Exported .env variables");

    Settings::open(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_empty_root() {
        let dir = TempDir::new().unwrap();
        let settings = bootstrap(ConfigPaths::new(dir.path())).unwrap();
        assert_eq!(settings.master(), vec!["console"]);
        assert!(dir.path().join(".env").exists());
    }

    #[test]
    fn test_bootstrap_rejects_malformed_config() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::new(dir.path());
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        std::fs::write(paths.config_dir().join("config.json"), "{").unwrap();
        assert!(matches!(bootstrap(paths), Err(ConfigError::Parse { .. })));
    }
}
