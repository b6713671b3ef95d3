//! On-disk layout of the configuration.
//!
//! ```text
//! <root>/
//!   .env
//!   package.json
//!   config/
//!     config.json adapter.json render.json
//!     pm2.json redis.json groups.json privates.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::schema::Section;

/// Resolved file locations under one root directory.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    root: PathBuf,
    config_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join("config");
        Self { root, config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    pub fn package_file(&self) -> PathBuf {
        self.root.join("package.json")
    }

    /// Backing file of a section.
    pub fn section_file(&self, section: Section) -> PathBuf {
        match section.file_name() {
            Some(name) => self.config_dir.join(name),
            None => self.env_file(),
        }
    }

    /// Write the default document for every section file that is missing.
    ///
    /// Existing files are never touched. Returns the sections that were created.
    pub fn seed_defaults(&self) -> Result<Vec<Section>, ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Write {
            path: self.config_dir.clone(),
            source,
        })?;

        let mut created = Vec::new();
        for section in Section::JSON_FILES {
            let path = self.section_file(section);
            if path.exists() {
                continue;
            }
            let body = serde_json::to_string_pretty(&section.defaults())?;
            fs::write(&path, body).map_err(|source| ConfigError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(section = %section, path = %path.display(), "Seeded default config");
            created.push(section);
        }

        let env_file = self.env_file();
        if !env_file.exists() {
            fs::write(&env_file, DEFAULT_ENV).map_err(|source| ConfigError::Write {
                path: env_file.clone(),
                source,
            })?;
            created.push(Section::Env);
        }

        Ok(created)
    }
}

const DEFAULT_ENV: &str = "\
# HTTP server
HTTP_PORT=7777
HTTP_HOST=127.0.0.1
# Admin API secret. `default` generates a fresh key on every start.
HTTP_AUTH_KEY=default
# Token renderers must send to /puppeteer. Empty disables the check.
WS_SERVER_AUTH_KEY=
# trace, debug, info, warn, error
LOG_LEVEL=info
";
