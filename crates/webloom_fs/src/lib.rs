use std::fmt::Debug;
use std::sync::Arc;

use webloom_error::Result;

mod memory;
mod native;

pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
  pub is_directory: bool,
  pub size: u64,
}

/// The persistent filesystem the pipeline compiles from. Paths are absolute
/// and Unix-style; every operation may suspend and may fail.
#[async_trait::async_trait]
pub trait FileSystem: Debug + Send + Sync {
  async fn read_file(&self, path: &str) -> Result<String>;
  async fn write_file(&self, path: &str, contents: &str) -> Result<()>;
  async fn exists(&self, path: &str) -> Result<bool>;
  async fn mkdir(&self, path: &str) -> Result<()>;
  async fn read_dir(&self, path: &str) -> Result<Vec<String>>;
  async fn stat(&self, path: &str) -> Result<FileStat>;
  async fn unlink(&self, path: &str) -> Result<()>;

  /// Whether `path` names an existing regular file. Extension probing only
  /// ever matches files, never directories.
  async fn is_file(&self, path: &str) -> Result<bool> {
    if !self.exists(path).await? {
      return Ok(false);
    }
    Ok(!self.stat(path).await?.is_directory)
  }
}

pub type SharedFileSystem = Arc<dyn FileSystem>;
