use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;
/// Result of an operation that may surface several independent failures.
pub type BatchResult<T> = std::result::Result<T, Errors>;

#[derive(Debug)]
enum ErrorKind {
  /// The filesystem rejected a read/exists/... call. Fatal per module.
  Filesystem {
    path: String,
    source: anyhow::Error,
  },
  /// The transform rejected the source. Fatal per module.
  Transform {
    id: String,
    detail: String,
  },
  /// The parser rejected the source during dependency extraction.
  /// Recoverable: the module compiles with an empty dependency list.
  Parse {
    id: String,
    detail: String,
  },
  /// A relative specifier had no filesystem match. Deferred to runtime.
  UnresolvedSpecifier {
    importer: String,
    specifier: String,
  },
  UnresolvedEntry {
    path: String,
  },
  NoLoadMethod {
    name: String,
  },
  ExternalLoad {
    name: String,
    url: Option<String>,
    source: anyhow::Error,
  },
  RuntimeIncomplete {
    missing: Vec<String>,
  },
  Io {
    source: std::io::Error,
  },
}

/// A single build failure. Carries a stable `code()` for programmatic
/// matching and an optional trail of human-readable contexts.
#[derive(Debug)]
pub struct Error {
  kind: ErrorKind,
  contexts: Vec<String>,
}

impl Error {
  fn new(kind: ErrorKind) -> Self {
    Self {
      kind,
      contexts: vec![],
    }
  }

  pub fn filesystem(path: impl Into<String>, source: anyhow::Error) -> Self {
    Self::new(ErrorKind::Filesystem {
      path: path.into(),
      source,
    })
  }

  pub fn transform(id: impl Into<String>, detail: impl Into<String>) -> Self {
    Self::new(ErrorKind::Transform {
      id: id.into(),
      detail: detail.into(),
    })
  }

  pub fn parse(id: impl Into<String>, detail: impl Into<String>) -> Self {
    Self::new(ErrorKind::Parse {
      id: id.into(),
      detail: detail.into(),
    })
  }

  pub fn unresolved_specifier(importer: impl Into<String>, specifier: impl Into<String>) -> Self {
    Self::new(ErrorKind::UnresolvedSpecifier {
      importer: importer.into(),
      specifier: specifier.into(),
    })
  }

  pub fn unresolved_entry(path: impl Into<String>) -> Self {
    Self::new(ErrorKind::UnresolvedEntry { path: path.into() })
  }

  pub fn no_load_method(name: impl Into<String>) -> Self {
    Self::new(ErrorKind::NoLoadMethod { name: name.into() })
  }

  pub fn external_load(
    name: impl Into<String>,
    url: Option<String>,
    source: anyhow::Error,
  ) -> Self {
    Self::new(ErrorKind::ExternalLoad {
      name: name.into(),
      url,
      source,
    })
  }

  pub fn runtime_incomplete(missing: Vec<String>) -> Self {
    Self::new(ErrorKind::RuntimeIncomplete { missing })
  }

  pub fn io_error(source: std::io::Error) -> Self {
    Self::new(ErrorKind::Io { source })
  }

  pub fn context(mut self, ctx: impl Into<String>) -> Self {
    self.contexts.push(ctx.into());
    self
  }

  pub fn code(&self) -> &'static str {
    match &self.kind {
      ErrorKind::Filesystem { .. } => "FILESYSTEM_ERROR",
      ErrorKind::Transform { .. } => "TRANSFORM_ERROR",
      ErrorKind::Parse { .. } => "PARSE_ERROR",
      ErrorKind::UnresolvedSpecifier { .. } => "UNRESOLVED_SPECIFIER",
      ErrorKind::UnresolvedEntry { .. } => "UNRESOLVED_ENTRY",
      ErrorKind::NoLoadMethod { .. } => "NO_LOAD_METHOD",
      ErrorKind::ExternalLoad { .. } => "EXTERNAL_LOAD_ERROR",
      ErrorKind::RuntimeIncomplete { .. } => "RUNTIME_INCOMPLETE",
      ErrorKind::Io { .. } => "IO_ERROR",
    }
  }

  /// Rendering for terminal output, code highlighted the way rollup-style
  /// tools print theirs.
  pub fn to_pretty_string(&self) -> String {
    format!(
      "{} {}",
      ansi_term::Colour::Red.bold().paint(self.code()),
      self
    )
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      ErrorKind::Filesystem { path, source } => {
        write!(f, "filesystem operation on {path} failed: {source}")
      }
      ErrorKind::Transform { id, detail } => {
        write!(f, "failed to transform {id}: {detail}")
      }
      ErrorKind::Parse { id, detail } => {
        write!(f, "failed to parse {id}: {detail}")
      }
      ErrorKind::UnresolvedSpecifier {
        importer,
        specifier,
      } => {
        write!(f, "could not resolve {specifier} imported by {importer}")
      }
      ErrorKind::UnresolvedEntry { path } => {
        write!(f, "could not resolve entry point {path}")
      }
      ErrorKind::NoLoadMethod { name } => {
        write!(f, "external library {name} has neither a global nor a url")
      }
      ErrorKind::ExternalLoad { name, url, source } => match url {
        Some(url) => write!(f, "failed to load external {name} from {url}: {source}"),
        None => write!(f, "failed to load external {name}: {source}"),
      },
      ErrorKind::RuntimeIncomplete { missing } => {
        write!(
          f,
          "runtime is missing required capabilities: {}",
          missing.join(", ")
        )
      }
      ErrorKind::Io { source } => write!(f, "{source}"),
    }?;
    for ctx in &self.contexts {
      write!(f, "\n  at {ctx}")?;
    }
    Ok(())
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Filesystem { source, .. } | ErrorKind::ExternalLoad { source, .. } => {
        Some(source.as_ref())
      }
      ErrorKind::Io { source } => Some(source),
      _ => None,
    }
  }
}

impl From<std::io::Error> for Error {
  fn from(source: std::io::Error) -> Self {
    Self::io_error(source)
  }
}

/// An ordered collection of build failures.
#[derive(Debug, Default)]
pub struct Errors(Vec<Error>);

impl Errors {
  pub fn from_vec(errors: Vec<Error>) -> Self {
    Self(errors)
  }

  pub fn push(&mut self, error: Error) {
    self.0.push(error);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Error> {
    self.0.iter()
  }

  pub fn into_vec(self) -> Vec<Error> {
    self.0
  }
}

impl From<Error> for Errors {
  fn from(error: Error) -> Self {
    Self(vec![error])
  }
}

impl fmt::Display for Errors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, error) in self.0.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "{error}")?;
    }
    Ok(())
  }
}

impl std::error::Error for Errors {}
