use serde::{Deserialize, Serialize};

/// ECMAScript level handed through to the transform. The pipeline neither
/// validates nor normalizes it beyond this enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsTarget {
  Es2015,
  Es2020,
  #[default]
  Es2022,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
  pub entry_point: String,
  #[serde(default)]
  pub include_style_layer: bool,
  #[serde(default)]
  pub target: EsTarget,
  #[serde(default)]
  pub externals: Vec<String>,
}

impl BuildOptions {
  pub fn new(entry_point: impl Into<String>) -> Self {
    Self {
      entry_point: entry_point.into(),
      include_style_layer: false,
      target: EsTarget::default(),
      externals: vec![],
    }
  }

  /// Canonical cache key. Field order is fixed by the struct, so equal
  /// options always serialize to the same string.
  pub fn cache_key(&self) -> String {
    serde_json::to_string(self).expect("BuildOptions is always serializable")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_options_share_a_cache_key() {
    let a = BuildOptions::new("/app.tsx");
    let b = BuildOptions::new("/app.tsx");
    assert_eq!(a.cache_key(), b.cache_key());

    let c = BuildOptions {
      target: EsTarget::Es2015,
      ..BuildOptions::new("/app.tsx")
    };
    assert_ne!(a.cache_key(), c.cache_key());
  }

  #[test]
  fn target_serializes_lowercase() {
    let key = BuildOptions::new("/app.tsx").cache_key();
    assert!(key.contains("\"es2022\""));
  }
}
