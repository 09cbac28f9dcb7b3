use crate::error::{CliError, Result};
use directories::ProjectDirs;
use mdrun::core::forcefield::library::{FORCEFIELD_SUBDIR, ForcefieldLibrary};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that replaces the platform data directory.
pub const DATA_DIR_ENV: &str = "MDRUN_DATA_DIR";

#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self::with_custom_path(path))
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { base_path: path }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn forcefield_dir(&self) -> PathBuf {
        self.base_path.join(FORCEFIELD_SUBDIR)
    }

    /// A library searching `extra_dir` (if given) before the data directory.
    pub fn library(&self, extra_dir: Option<&Path>) -> ForcefieldLibrary {
        let mut dirs: Vec<PathBuf> = extra_dir.map(Path::to_path_buf).into_iter().collect();
        dirs.push(self.base_path.clone());
        ForcefieldLibrary::new(dirs)
    }

    fn determine_data_path(env_override: Option<PathBuf>) -> Result<PathBuf> {
        match env_override {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Self::get_default_data_path(),
        }
    }

    fn get_default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "mdrun", "mdrun")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}
