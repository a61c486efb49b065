//! Fixture helpers shared by integration tests.

use std::sync::Arc;

use webloom_core::{Pipeline, RecordingHost};
use webloom_fs::{FileSystem, MemoryFileSystem, SharedFileSystem};

/// Build an in-memory filesystem from `(path, contents)` pairs.
pub async fn fixture(files: &[(&str, &str)]) -> SharedFileSystem {
  let fs = MemoryFileSystem::new();
  for (path, contents) in files {
    fs.write_file(path, contents)
      .await
      .unwrap_or_else(|err| panic!("fixture write of {path} failed: {err}"));
  }
  Arc::new(fs)
}

/// A pipeline over an in-memory fixture, scripts discarded.
pub async fn pipeline(files: &[(&str, &str)]) -> Pipeline {
  Pipeline::new(fixture(files).await)
}

/// A pipeline whose host records every evaluated script.
pub async fn recording_pipeline(files: &[(&str, &str)]) -> (Pipeline, Arc<RecordingHost>) {
  let host = Arc::new(RecordingHost::new());
  let pipeline = Pipeline::with_host(fixture(files).await, host.clone());
  (pipeline, host)
}
