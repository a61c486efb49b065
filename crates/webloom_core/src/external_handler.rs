use hashlink::LinkedHashMap;
use webloom_common::ExternalLibrary;
use webloom_runtime_helpers::{EXTERNAL_NAMES_SLOT, EXTERNAL_RECORDS_SLOT, EXTERNAL_SETUP};

const REACT_VERSION: &str = "18.2.0";

/// Registry of libraries resolved at runtime instead of compiled from
/// source. Registration order is preserved so the emitted setup stub is
/// byte-stable across builds.
#[derive(Debug, Default)]
pub struct ExternalHandler {
  registry: LinkedHashMap<String, ExternalLibrary>,
}

impl ExternalHandler {
  pub fn new() -> Self {
    Self::default()
  }

  /// The React-equivalent pair every bundle boots against.
  pub fn register_defaults(&mut self) {
    self.register(ExternalLibrary {
      name: "react".to_string(),
      global: Some("React".to_string()),
      url: Some(format!("https://esm.sh/react@{REACT_VERSION}")),
      version: Some(REACT_VERSION.to_string()),
      dependencies: vec![],
    });
    self.register(ExternalLibrary {
      name: "react-dom".to_string(),
      global: Some("ReactDOM".to_string()),
      url: Some(format!("https://esm.sh/react-dom@{REACT_VERSION}")),
      version: Some(REACT_VERSION.to_string()),
      dependencies: vec!["react".to_string()],
    });
  }

  /// First registration of a name wins; later ones are ignored.
  pub fn register(&mut self, library: ExternalLibrary) -> bool {
    if self.registry.contains_key(&library.name) {
      tracing::debug!("external {} already registered, keeping the existing record", library.name);
      return false;
    }
    tracing::debug!("registered external {}", library.name);
    self.registry.insert(library.name.clone(), library);
    true
  }

  pub fn is_registered(&self, name: &str) -> bool {
    self.registry.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&ExternalLibrary> {
    self.registry.get(name)
  }

  pub fn len(&self) -> usize {
    self.registry.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.is_empty()
  }

  pub fn records(&self) -> impl Iterator<Item = &ExternalLibrary> {
    self.registry.values()
  }

  /// The external-setup section of a bundle: the loader template with this
  /// registry's records and name list substituted in.
  pub fn setup_stub(&self) -> String {
    let mut records = serde_json::Map::new();
    for library in self.registry.values() {
      records.insert(
        library.name.clone(),
        serde_json::to_value(library).expect("external record is always serializable"),
      );
    }
    let names: Vec<&str> = self.registry.keys().map(String::as_str).collect();

    EXTERNAL_SETUP
      .replace(
        EXTERNAL_RECORDS_SLOT,
        &serde_json::Value::Object(records).to_string(),
      )
      .replace(
        EXTERNAL_NAMES_SLOT,
        &serde_json::to_string(&names).expect("name list is always serializable"),
      )
  }
}
