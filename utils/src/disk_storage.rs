//! Utilities for storing a struct in a file on the disk.
//! The struct should implement Serialize and Deserialize from serde.
//! Supported file formats are TOML and YAML.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::{de::DeserializeOwned, Serialize};

pub const APP_DIR: &str = ".setchart";

pub enum FileFormat {
    TOML,
    YAML,
}

impl FileFormat {
    fn extension(&self) -> &'static str {
        match self {
            FileFormat::TOML => "toml",
            FileFormat::YAML => "yaml",
        }
    }
}

pub trait DiskStorageInterface
where
    Self: Sized + Debug + Default + Serialize + DeserializeOwned,
{
    const FILE_NAME: &'static str;
    const FORMAT: FileFormat;

    /// Get the path to the file
    fn path() -> crate::Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or(crate::Error::BaseDirsFailed)?;
        let path = dirs
            .home_dir()
            .join(APP_DIR)
            .join(Self::FILE_NAME)
            .with_extension(Self::FORMAT.extension());
        Ok(path)
    }

    /// Load the content from the file if it exists otherwise return the default value
    fn load() -> crate::Result<Self> {
        let path = Self::path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the content from an explicit location, the file must exist
    fn load_from(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::Error::FileReadFailed(path.to_path_buf(), e))?;

        match Self::FORMAT {
            FileFormat::TOML => toml::from_str(&content)
                .map_err(|e| crate::Error::TomlParsingFailed(path.to_path_buf(), e)),
            FileFormat::YAML => serde_yaml::from_str(&content)
                .map_err(|e| crate::Error::YamlParsingFailed(path.to_path_buf(), e)),
        }
    }

    /// Save content to a file, creating the directories and file as necessary
    fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| crate::Error::CreateDirAllFailed(parent.to_path_buf(), e))?;
        }

        let content = match Self::FORMAT {
            FileFormat::TOML => toml::to_string_pretty(self)
                .map_err(|e| crate::Error::TomlFormattingFailed(format!("{self:?}"), e))?,
            FileFormat::YAML => serde_yaml::to_string(self)
                .map_err(|e| crate::Error::YamlFormattingFailed(format!("{self:?}"), e))?,
        };

        fs::write(path, content).map_err(|e| crate::Error::FileWriteFailed(path.to_path_buf(), e))
    }
}
