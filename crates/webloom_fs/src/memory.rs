use anyhow::anyhow;
use dashmap::{DashMap, DashSet};
use webloom_error::{Error, Result};

use crate::{FileStat, FileSystem};

/// A purely in-memory filesystem keyed by absolute path. This is the
/// browser-storage analogue the pipeline was designed against, and the
/// backend every test fixture uses.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
  files: DashMap<String, String>,
  dirs: DashSet<String>,
}

impl MemoryFileSystem {
  pub fn new() -> Self {
    Self::default()
  }

  fn check_absolute(path: &str) -> Result<&str> {
    if !path.starts_with('/') {
      return Err(Error::filesystem(
        path,
        anyhow!("paths must be absolute and Unix-style"),
      ));
    }
    Ok(if path.len() > 1 {
      path.trim_end_matches('/')
    } else {
      path
    })
  }

  fn register_ancestors(&self, path: &str) {
    let mut idx = 0;
    while let Some(next) = path[idx + 1..].find('/') {
      idx += next + 1;
      self.dirs.insert(path[..idx].to_string());
    }
  }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
  async fn read_file(&self, path: &str) -> Result<String> {
    let path = Self::check_absolute(path)?;
    self
      .files
      .get(path)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::filesystem(path, anyhow!("no such file")))
  }

  async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
    let path = Self::check_absolute(path)?;
    self.register_ancestors(path);
    self.files.insert(path.to_string(), contents.to_string());
    Ok(())
  }

  async fn exists(&self, path: &str) -> Result<bool> {
    let path = Self::check_absolute(path)?;
    Ok(path == "/" || self.files.contains_key(path) || self.dirs.contains(path))
  }

  async fn mkdir(&self, path: &str) -> Result<()> {
    let path = Self::check_absolute(path)?;
    self.register_ancestors(path);
    if path != "/" {
      self.dirs.insert(path.to_string());
    }
    Ok(())
  }

  async fn read_dir(&self, path: &str) -> Result<Vec<String>> {
    let path = Self::check_absolute(path)?;
    if path != "/" && !self.dirs.contains(path) {
      return Err(Error::filesystem(path, anyhow!("no such directory")));
    }
    let prefix = if path == "/" {
      "/".to_string()
    } else {
      format!("{path}/")
    };
    let mut names: Vec<String> = self
      .files
      .iter()
      .map(|entry| entry.key().clone())
      .chain(self.dirs.iter().map(|entry| entry.key().clone()))
      .filter_map(|candidate| {
        let rest = candidate.strip_prefix(&prefix)?;
        if rest.is_empty() || rest.contains('/') {
          None
        } else {
          Some(rest.to_string())
        }
      })
      .collect();
    names.sort_unstable();
    names.dedup();
    Ok(names)
  }

  async fn stat(&self, path: &str) -> Result<FileStat> {
    let path = Self::check_absolute(path)?;
    if let Some(entry) = self.files.get(path) {
      return Ok(FileStat {
        is_directory: false,
        size: entry.value().len() as u64,
      });
    }
    if path == "/" || self.dirs.contains(path) {
      return Ok(FileStat {
        is_directory: true,
        size: 0,
      });
    }
    Err(Error::filesystem(path, anyhow!("no such file or directory")))
  }

  async fn unlink(&self, path: &str) -> Result<()> {
    let path = Self::check_absolute(path)?;
    self
      .files
      .remove(path)
      .map(|_| ())
      .ok_or_else(|| Error::filesystem(path, anyhow!("no such file")))
  }
}
