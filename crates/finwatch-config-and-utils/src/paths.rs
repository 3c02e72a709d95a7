//! On-disk layout of the local FinWatch data directory.
//!
//! ```text
//! ~/.finwatch/
//!   config.json
//!   credentials.json     token + cached profile, fingerprint-keyed
//!   logs/finwatch.jsonl  only with FINWATCH_LOG_JSON=1
//! ```

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = ".finwatch";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve `~/.finwatch`.
    pub fn new() -> CoreResult<Self> {
        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(DATA_DIR_NAME)))
            .ok_or_else(|| CoreError::Path("no home directory; pass --base-dir".to_string()))
    }

    /// Root everything at `root` instead (tests, `--base-dir`, `FINWATCH_HOME`).
    pub fn with_base_dir(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Backing file for the persistent key-value store.
    pub fn credentials_file(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("finwatch.jsonl")
    }

    /// Create the data and log directories if missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        for dir in [self.root.clone(), self.logs_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
