use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::PathBuf;

/// Overrides the platform data directory when set.
pub const DATA_DIR_ENV: &str = "MEALTRACK_DATA_DIR";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = resolve_data_dir(std::env::var_os(DATA_DIR_ENV))?;
        Self::from_data_dir(data_dir)
    }

    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("mealtrack.db");

        Ok(Config { db_path, data_dir })
    }
}

/// An empty override counts as unset.
fn resolve_data_dir(override_dir: Option<OsString>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => {
            let proj_dirs = ProjectDirs::from("", "", "mealtrack")
                .context("Could not determine home directory")?;
            Ok(proj_dirs.data_dir().to_path_buf())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("nested").join("mealtrack");
        let config = Config::from_data_dir(data_dir.clone()).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(config.data_dir, data_dir);
        assert_eq!(config.db_path, data_dir.join("mealtrack.db"));
    }

    #[test]
    fn test_data_dir_override_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = resolve_data_dir(Some(tmp.path().as_os_str().to_owned())).unwrap();
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn test_empty_data_dir_override_is_ignored() {
        let Ok(default_dir) = resolve_data_dir(None) else {
            return;
        };
        assert_eq!(resolve_data_dir(Some(OsString::new())).unwrap(), default_dir);
    }

    #[test]
    fn test_from_data_dir_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::from_data_dir(tmp.path().to_path_buf()).unwrap();
        assert_eq!(config.db_path, tmp.path().join("mealtrack.db"));
    }
}
