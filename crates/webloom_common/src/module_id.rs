use std::fmt;

/// Identifier of a module in the graph.
///
/// Internal modules are identified by an absolute, canonicalized Unix-style
/// path starting with `/`. External modules are identified by the bare
/// specifier they were imported with (`react`, `lodash/fp`, ...) and are
/// opaque to the compiler.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
  id: String,
  external: bool,
}

impl ModuleId {
  pub fn new(id: impl Into<String>, external: bool) -> Self {
    Self {
      id: id.into(),
      external,
    }
  }

  pub fn internal(id: impl Into<String>) -> Self {
    Self::new(id, false)
  }

  pub fn external(name: impl Into<String>) -> Self {
    Self::new(name, true)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn is_external(&self) -> bool {
    self.external
  }

  /// Directory portion of the id, used as the base for resolving relative
  /// specifiers. External ids have no directory.
  pub fn dir(&self) -> &str {
    if self.external {
      return "";
    }
    match self.id.rfind('/') {
      Some(0) | None => "/",
      Some(idx) => &self.id[..idx],
    }
  }

  /// Identifier-safe form of the id, used to name the `require` binding in
  /// generated preambles. Every non-alphanumeric byte maps to `_`.
  pub fn slug(&self) -> String {
    self
      .id
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
      .collect()
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    &self.id
  }
}

impl fmt::Display for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.id)
  }
}

impl fmt::Debug for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.external {
      write!(f, "ModuleId({:?}, external)", self.id)
    } else {
      write!(f, "ModuleId({:?})", self.id)
    }
  }
}

/// Whether a specifier names an external module. Anything that does not start
/// with `.` or `/` is external by shape; the external registry only decides
/// how such a name gets loaded, never whether it is external.
pub fn is_bare_specifier(specifier: &str) -> bool {
  !specifier.starts_with('.') && !specifier.starts_with('/')
}
