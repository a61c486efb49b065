use serde::{Deserialize, Serialize};

/// A library that is never compiled from source. The record describes how the
/// emitted bundle can obtain it at runtime: from a host global, from a CDN
/// url, or both. Records without either cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLibrary {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub global: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub dependencies: Vec<String>,
}

impl ExternalLibrary {
  /// A record backed only by a host global, used for caller-declared
  /// externals the registry knows nothing else about.
  pub fn global_only(name: impl Into<String>) -> Self {
    let name = name.into();
    Self {
      global: Some(name.clone()),
      name,
      url: None,
      version: None,
      dependencies: vec![],
    }
  }

  pub fn is_loadable(&self) -> bool {
    self.global.is_some() || self.url.is_some()
  }
}
