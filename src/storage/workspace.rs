//! Workspace management
//!
//! A workspace is a directory containing `.cadence/` with the blob store
//! and configuration. Commands locate it by walking up from the current
//! directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, FileStore};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in a cadence workspace. Run 'cadence init' first.")]
    NotInWorkspace,
}

/// A Cadence workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let cadence_dir = root.join(".cadence");

        if !cadence_dir.is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or an ancestor
    pub fn open_current() -> Result<Self> {
        let root = Self::find_root().ok_or(WorkspaceError::NotInWorkspace)?;
        Self::open(root)
    }

    /// Initializes a new workspace at the given path (idempotent)
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let cadence_dir = root.join(".cadence");

        fs::create_dir_all(cadence_dir.join("store")).with_context(|| {
            format!(
                "Failed to create .cadence directory: {}",
                cadence_dir.display()
            )
        })?;

        Config::write_default(&root)?;

        Self::open(root)
    }

    /// Walks up from the current directory looking for `.cadence/`
    fn find_root() -> Option<PathBuf> {
        let mut dir = env::current_dir().ok()?;
        loop {
            if dir.join(".cadence").is_dir() {
                return Some(dir);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Returns the workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the workspace configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the blob store backing this workspace's registry
    pub fn blob_store(&self) -> FileStore {
        FileStore::new(self.root.join(".cadence").join("store"))
    }
}
