use std::path::Path;

use sugar_path::SugarPathBuf;
use webloom_common::ModuleId;
use webloom_error::{Error, Result};
use webloom_fs::SharedFileSystem;

/// File-level probe order. The first extension that names an existing file
/// wins; directory index files are only consulted when none of these hit.
pub const EXTENSIONS: [&str; 5] = [".tsx", ".ts", ".jsx", ".js", ".css"];

const INDEX_EXTENSIONS: [&str; 4] = [".tsx", ".ts", ".jsx", ".js"];

#[derive(Debug)]
pub struct Resolver {
  fs: SharedFileSystem,
}

impl Resolver {
  pub fn new(fs: SharedFileSystem) -> Self {
    Self { fs }
  }

  /// Collapse a specifier against the importer's directory into an absolute
  /// candidate path. No filesystem access; this is the id an unresolved
  /// import keeps so the failure surfaces at runtime instead.
  pub fn canonicalize(importer: Option<&ModuleId>, specifier: &str) -> String {
    let joined = if specifier.starts_with('/') {
      Path::new(specifier).to_path_buf()
    } else {
      let dir = importer.map(ModuleId::dir).unwrap_or("/");
      Path::new(dir).join(specifier)
    };
    joined.into_normalize().to_string_lossy().into_owned()
  }

  /// Resolve a relative or absolute specifier to a concrete file id.
  /// `Ok(None)` means every probe missed.
  pub async fn resolve(
    &self,
    importer: Option<&ModuleId>,
    specifier: &str,
  ) -> Result<Option<String>> {
    let base = Self::canonicalize(importer, specifier);

    if self.fs.is_file(&base).await? {
      return Ok(Some(base));
    }
    for ext in EXTENSIONS {
      let candidate = format!("{base}{ext}");
      if self.fs.is_file(&candidate).await? {
        return Ok(Some(candidate));
      }
    }
    for ext in INDEX_EXTENSIONS {
      let candidate = format!("{base}/index{ext}");
      if self.fs.is_file(&candidate).await? {
        return Ok(Some(candidate));
      }
    }

    tracing::debug!("no filesystem match for specifier {specifier} (base {base})");
    Ok(None)
  }

  pub async fn resolve_entry(&self, path: &str) -> Result<String> {
    self
      .resolve(None, path)
      .await?
      .ok_or_else(|| Error::unresolved_entry(path))
  }
}
