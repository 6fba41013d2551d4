//! Project discovery - a gauge crib is any directory containing `.gtt/`

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_DIR: &str = ".gtt";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not a gauge tracking project (no .gtt directory found in {0} or its parents). Run 'gtt init' first")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A located project root
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` until a `.gtt` directory is found
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(|dir| Self {
                root: dir.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create `.gtt/` with a default config in `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        let gtt = root.join(PROJECT_DIR);
        if gtt.exists() {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&gtt)?;
        fs::write(gtt.join("config.yaml"), crate::core::config::DEFAULT_CONFIG)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gtt_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Resolve a config path relative to the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
