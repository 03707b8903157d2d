//! Application-scoped context supplied once by the host at process start.
//!
//! # Responsibility
//! - Describe where HabitHub data lives (file directory or in-memory).
//! - Carry storage policy flags consumed by the database factory.
//!
//! # Invariants
//! - File storage always points at an absolute directory.
//! - The context is immutable once bound into the provisioning graph.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "HABITHUB_DATA_DIR";
/// Environment variable forcing in-memory storage when set to `1`/`true`.
pub const IN_MEMORY_ENV: &str = "HABITHUB_IN_MEMORY";

const DEFAULT_DATA_DIR_NAME: &str = "habithub";

/// Where the persistence handle keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// SQLite file inside this directory.
    File { data_dir: PathBuf },
    /// Private in-memory database, discarded at process exit.
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    EmptyDataDir,
    RelativeDataDir(PathBuf),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDataDir => write!(f, "data_dir cannot be empty"),
            Self::RelativeDataDir(path) => write!(
                f,
                "data_dir must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ContextError {}

/// Application-scoped context handed to the database factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    storage: StorageLocation,
    destructive_migration_fallback: bool,
}

impl AppContext {
    /// File-backed context rooted at `data_dir`.
    ///
    /// # Errors
    /// - Returns an error when `data_dir` is empty or relative.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Result<Self, ContextError> {
        let raw = data_dir.as_ref();
        if raw.as_os_str().is_empty() {
            return Err(ContextError::EmptyDataDir);
        }
        if !raw.is_absolute() {
            return Err(ContextError::RelativeDataDir(raw.to_path_buf()));
        }
        Ok(Self {
            storage: StorageLocation::File {
                data_dir: raw.to_path_buf(),
            },
            destructive_migration_fallback: true,
        })
    }

    /// Context backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageLocation::InMemory,
            destructive_migration_fallback: true,
        }
    }

    /// Builds a context from `HABITHUB_DATA_DIR` / `HABITHUB_IN_MEMORY`.
    ///
    /// Falls back to `<tmp>/habithub` when no usable directory is configured.
    pub fn from_env() -> Self {
        let in_memory = std::env::var(IN_MEMORY_ENV)
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        if in_memory {
            return Self::in_memory();
        }

        std::env::var(DATA_DIR_ENV)
            .ok()
            .and_then(|raw| Self::with_data_dir(raw.trim()).ok())
            .unwrap_or_else(|| Self {
                storage: StorageLocation::File {
                    data_dir: std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME),
                },
                destructive_migration_fallback: true,
            })
    }

    /// Toggles dropping and recreating the schema when the stored version is
    /// newer than this build understands. Enabled by default.
    pub fn destructive_migration_fallback(mut self, enabled: bool) -> Self {
        self.destructive_migration_fallback = enabled;
        self
    }

    pub fn storage(&self) -> &StorageLocation {
        &self.storage
    }

    pub fn allows_destructive_migration(&self) -> bool {
        self.destructive_migration_fallback
    }
}
