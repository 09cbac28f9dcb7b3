use super::params::{Forcefield, ParamLoadError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Subdirectory of each search directory that holds named force-field files.
pub const FORCEFIELD_SUBDIR: &str = "forcefields";

const FORCEFIELD_EXTENSION: &str = "toml";

/// Identifies a force-field parameter file, either by path or by a name that is looked up
/// in the library's search directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForceFieldId(String);

impl ForceFieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ForceFieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ForceFieldId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ForceFieldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForcefieldLibrary {
    search_dirs: Vec<PathBuf>,
}

impl ForcefieldLibrary {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Resolves an identifier to a file.
    ///
    /// An identifier naming an existing file is used directly. Otherwise each search
    /// directory's `forcefields/` subdirectory is tried, first with the identifier as given
    /// and then with a `.toml` extension appended.
    pub fn resolve(&self, id: &ForceFieldId) -> Result<PathBuf, ParamLoadError> {
        let direct = Path::new(id.as_str());
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let mut searched = vec![direct.to_path_buf()];
        for dir in &self.search_dirs {
            let base = dir.join(FORCEFIELD_SUBDIR);
            let exact = base.join(id.as_str());
            let with_ext = base.join(format!("{}.{}", id.as_str(), FORCEFIELD_EXTENSION));
            for candidate in [exact, with_ext] {
                if candidate.is_file() {
                    debug!(id = %id, path = %candidate.display(), "Resolved force field");
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }

        Err(ParamLoadError::UnknownForceField {
            id: id.to_string(),
            searched,
        })
    }

    /// Resolves every identifier and loads the merged parameter set.
    pub fn load(&self, ids: &[ForceFieldId]) -> Result<Forcefield, ParamLoadError> {
        let paths = ids
            .iter()
            .map(|id| self.resolve(id))
            .collect::<Result<Vec<_>, _>>()?;
        Forcefield::load(&paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ARGON: &str = "[atom_types.Ar]\nelement = \"Ar\"\ncharge = 0.0\nsigma = 0.3405\nepsilon = 0.996\n";

    #[test]
    fn resolve_prefers_an_existing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, ARGON).unwrap();

        let library = ForcefieldLibrary::default();
        let id = ForceFieldId::new(path.to_string_lossy().into_owned());
        assert_eq!(library.resolve(&id).unwrap(), path);
    }

    #[test]
    fn resolve_searches_dirs_with_and_without_extension() {
        let empty = tempdir().unwrap();
        let data = tempdir().unwrap();
        let ff_dir = data.path().join(FORCEFIELD_SUBDIR);
        fs::create_dir_all(&ff_dir).unwrap();
        fs::write(ff_dir.join("argon.toml"), ARGON).unwrap();
        fs::write(ff_dir.join("plain"), ARGON).unwrap();

        let search_dirs = vec![empty.path().to_path_buf(), data.path().to_path_buf()];
        let library = ForcefieldLibrary::new(search_dirs);
        assert_eq!(
            library.resolve(&"argon".into()).unwrap(),
            ff_dir.join("argon.toml")
        );
        assert_eq!(
            library.resolve(&"argon.toml".into()).unwrap(),
            ff_dir.join("argon.toml")
        );
        assert_eq!(library.resolve(&"plain".into()).unwrap(), ff_dir.join("plain"));
    }

    #[test]
    fn unknown_identifier_lists_searched_locations() {
        let data = tempdir().unwrap();
        let library = ForcefieldLibrary::new(vec![data.path().to_path_buf()]);
        match library.resolve(&"amber99".into()) {
            Err(ParamLoadError::UnknownForceField { id, searched }) => {
                assert_eq!(id, "amber99");
                assert_eq!(searched.len(), 3);
            }
            other => panic!("expected UnknownForceField, got {:?}", other),
        }
    }

    #[test]
    fn load_resolves_and_merges() {
        let data = tempdir().unwrap();
        let ff_dir = data.path().join(FORCEFIELD_SUBDIR);
        fs::create_dir_all(&ff_dir).unwrap();
        fs::write(ff_dir.join("argon.toml"), ARGON).unwrap();

        let library = ForcefieldLibrary::new(vec![data.path().to_path_buf()]);
        let ff = library.load(&["argon".into()]).unwrap();
        assert!(ff.atom_types.contains_key("Ar"));
    }
}
