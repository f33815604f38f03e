use std::env::current_dir;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context as _};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

fn expand<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    Ok(shellexpand::full(&path.as_ref().to_string_lossy())?.parse()?)
}

/// An absolute path that may or may not exist.
///
/// Config values and command line paths pass through here so that `~` and
/// environment variables are expanded exactly once.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsPathBuf(PathBuf);

impl AbsPathBuf {
    /// Returns error if `path` is not absolute.
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(anyhow!("Path is not absolute : {}", path.display()));
        }
        // normalizes `a//b`, `a/./b` and trailing separators
        Ok(Self(path.components().collect()))
    }

    pub fn from_shell_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_new(expand(path)?)
    }

    pub fn cwd() -> Result<Self> {
        Ok(Self(current_dir()?))
    }

    pub fn join<P: AsRef<Path>>(&self, path: P) -> Self {
        Self(self.0.join(path))
    }

    /// Resolves `path` against `self` unless it is already absolute.
    pub fn join_expand<P: AsRef<Path>>(&self, path: P) -> Result<Self> {
        Ok(self.join(expand(path)?))
    }

    pub fn parent(&self) -> Option<Self> {
        self.0.parent().map(|parent| Self(parent.to_owned()))
    }

    /// Walks up from `self` and returns the first directory holding `file_name`.
    pub fn search_dir_contains(&self, file_name: &str) -> Option<Self> {
        self.0
            .ancestors()
            .find(|dir| dir.join(file_name).is_file())
            .map(|dir| Self(dir.to_owned()))
    }

    pub fn load<T>(&self, load: impl FnOnce(fs::File) -> Result<T>) -> Result<T> {
        fs::OpenOptions::new()
            .read(true)
            .open(&self.0)
            .with_context(|| format!("Could not open file : {}", self))
            .and_then(load)
    }

    pub fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(&self.0)
    }

    pub fn create_dir_all_and_open(&self, is_read: bool, is_write: bool) -> io::Result<fs::File> {
        if let Some(dir) = self.parent() {
            dir.create_dir_all()?
        }
        fs::OpenOptions::new()
            .read(is_read)
            .write(is_write)
            .create(true)
            .open(&self.0)
    }

    pub fn create_dir_all(&self) -> io::Result<()> {
        fs::create_dir_all(&self.0)
    }

    pub fn is_file(&self) -> bool {
        self.0.is_file()
    }
}

impl AsRef<Path> for AbsPathBuf {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl FromStr for AbsPathBuf {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_shell_path(s)
    }
}

impl<'de> Deserialize<'de> for AbsPathBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl fmt::Display for AbsPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.display().fmt(f)
    }
}
