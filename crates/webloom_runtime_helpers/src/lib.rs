//! JavaScript snippets concatenated into every emitted bundle. The
//! assembler substitutes the `__UPPER_SNAKE__` placeholders before emission.

/// Installs `define`/`require` and the module registry on the host global.
pub const MODULE_REGISTRY: &str = include_str!("./runtime/module_registry.js");

/// Loads external libraries and publishes `__setupExternals`. Placeholders:
/// [`EXTERNAL_RECORDS_SLOT`] (JSON object) and [`EXTERNAL_NAMES_SLOT`]
/// (JSON array).
pub const EXTERNAL_SETUP: &str = include_str!("./runtime/external_setup.js");

/// Adds the optional utility-CSS `<link>` tag. Placeholder:
/// [`STYLE_LAYER_URL_SLOT`] (JSON string).
pub const STYLE_LAYER: &str = include_str!("./runtime/style_layer.js");

/// Requires the entry module and mounts it. Placeholder: [`ENTRY_ID_SLOT`]
/// (JSON string).
pub const BOOTSTRAP: &str = include_str!("./runtime/bootstrap.js");

pub const EXTERNAL_RECORDS_SLOT: &str = "__EXTERNAL_RECORDS__";
pub const EXTERNAL_NAMES_SLOT: &str = "__EXTERNAL_NAMES__";
pub const STYLE_LAYER_URL_SLOT: &str = "__STYLE_LAYER_URL__";
pub const ENTRY_ID_SLOT: &str = "__ENTRY_ID__";

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn templates_carry_their_placeholders() {
    assert!(EXTERNAL_SETUP.contains(EXTERNAL_RECORDS_SLOT));
    assert!(EXTERNAL_SETUP.contains(EXTERNAL_NAMES_SLOT));
    assert!(STYLE_LAYER.contains(STYLE_LAYER_URL_SLOT));
    assert!(BOOTSTRAP.contains(ENTRY_ID_SLOT));
  }

  #[test]
  fn registry_installs_the_loader_surface() {
    for symbol in ["global.define", "global.require", "global.defineExternal"] {
      assert!(MODULE_REGISTRY.contains(symbol));
    }
    assert!(MODULE_REGISTRY.contains("CircularDependency"));
    assert!(MODULE_REGISTRY.contains("ModuleNotFound"));
  }

  #[test]
  fn external_setup_reports_missing_runtime_capabilities() {
    assert!(EXTERNAL_SETUP.contains("RuntimeIncomplete"));
    assert!(EXTERNAL_SETUP.contains("NoLoadMethod"));
    for hook in ["useState", "useEffect", "useContext", "useReducer"] {
      assert!(EXTERNAL_SETUP.contains(hook));
    }
  }
}
