use std::path::{Path, PathBuf};

use anyhow::anyhow;
use webloom_error::{Error, Result};

use crate::{FileStat, FileSystem};

/// Maps the virtual absolute namespace onto a directory of the real
/// filesystem, for running the pipeline against fixtures on disk.
#[derive(Debug)]
pub struct NativeFileSystem {
  root: PathBuf,
}

impl NativeFileSystem {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn real_path(&self, path: &str) -> Result<PathBuf> {
    if !path.starts_with('/') {
      return Err(Error::filesystem(
        path,
        anyhow!("paths must be absolute and Unix-style"),
      ));
    }
    let relative = path.trim_start_matches('/');
    let mut real = self.root.clone();
    for segment in Path::new(relative) {
      // `..` escaping the root would leave the virtual namespace
      if segment == ".." {
        return Err(Error::filesystem(path, anyhow!("path escapes the root")));
      }
      real.push(segment);
    }
    Ok(real)
  }
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
  async fn read_file(&self, path: &str) -> Result<String> {
    let real = self.real_path(path)?;
    tokio::fs::read_to_string(&real)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))
  }

  async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
    let real = self.real_path(path)?;
    if let Some(parent) = real.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| Error::filesystem(path, e.into()))?;
    }
    tokio::fs::write(&real, contents)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))
  }

  async fn exists(&self, path: &str) -> Result<bool> {
    let real = self.real_path(path)?;
    Ok(tokio::fs::metadata(&real).await.is_ok())
  }

  async fn mkdir(&self, path: &str) -> Result<()> {
    let real = self.real_path(path)?;
    tokio::fs::create_dir_all(&real)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))
  }

  async fn read_dir(&self, path: &str) -> Result<Vec<String>> {
    let real = self.real_path(path)?;
    let mut entries = tokio::fs::read_dir(&real)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))?;
    let mut names = vec![];
    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|e| Error::filesystem(path, e.into()))?
    {
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort_unstable();
    Ok(names)
  }

  async fn stat(&self, path: &str) -> Result<FileStat> {
    let real = self.real_path(path)?;
    let meta = tokio::fs::metadata(&real)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))?;
    Ok(FileStat {
      is_directory: meta.is_dir(),
      size: meta.len(),
    })
  }

  async fn unlink(&self, path: &str) -> Result<()> {
    let real = self.real_path(path)?;
    tokio::fs::remove_file(&real)
      .await
      .map_err(|e| Error::filesystem(path, e.into()))
  }
}
