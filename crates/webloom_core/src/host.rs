use std::fmt::Debug;
use std::sync::Mutex;

use webloom_error::Result;

/// Where emitted JavaScript gets evaluated. The pipeline never executes
/// code itself; it hands complete scripts to the host realm.
#[async_trait::async_trait]
pub trait ScriptHost: Debug + Send + Sync {
  async fn eval(&self, script: &str) -> Result<()>;
}

/// Discards every script. The default for callers that only want bundle
/// strings.
#[derive(Debug, Default)]
pub struct NullHost;

#[async_trait::async_trait]
impl ScriptHost for NullHost {
  async fn eval(&self, _script: &str) -> Result<()> {
    Ok(())
  }
}

/// Captures evaluated scripts in order, for asserting on what would have
/// reached the realm.
#[derive(Debug, Default)]
pub struct RecordingHost {
  scripts: Mutex<Vec<String>>,
}

impl RecordingHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn scripts(&self) -> Vec<String> {
    self.scripts.lock().expect("host lock poisoned").clone()
  }
}

#[async_trait::async_trait]
impl ScriptHost for RecordingHost {
  async fn eval(&self, script: &str) -> Result<()> {
    self
      .scripts
      .lock()
      .expect("host lock poisoned")
      .push(script.to_string());
    Ok(())
  }
}
