use rustc_hash::FxHashSet;
use swc_core::ecma::ast;
use swc_core::ecma::atoms::JsWord;
use swc_core::ecma::visit::{Visit, VisitWith};

/// Source specifiers referenced by a module, in first-occurrence order.
/// Covers `import ... from`, `export ... from` and `export * from`.
#[derive(Debug, Default)]
pub struct ScanResult {
  pub dependencies: Vec<JsWord>,
}

pub fn scan(module: &ast::Module) -> ScanResult {
  let mut collector = DependencyCollector::default();
  module.visit_with(&mut collector);
  ScanResult {
    dependencies: collector.dependencies,
  }
}

#[derive(Default)]
struct DependencyCollector {
  dependencies: Vec<JsWord>,
  seen: FxHashSet<JsWord>,
}

impl DependencyCollector {
  fn add(&mut self, specifier: &JsWord) {
    if self.seen.insert(specifier.clone()) {
      self.dependencies.push(specifier.clone());
    }
  }
}

impl Visit for DependencyCollector {
  fn visit_import_decl(&mut self, n: &ast::ImportDecl) {
    self.add(&n.src.value);
  }

  fn visit_named_export(&mut self, n: &ast::NamedExport) {
    if let Some(src) = &n.src {
      self.add(&src.value);
    }
  }

  fn visit_export_all(&mut self, n: &ast::ExportAll) {
    self.add(&n.src.value);
  }
}

#[cfg(test)]
mod tests {
  use webloom_common::{EsTarget, Loader};
  use webloom_compiler::{es_version, syntax_for, COMPILER};

  use super::*;

  fn scan_source(source: &str) -> Vec<String> {
    let module = COMPILER
      .parse_str(
        "/scan-test.tsx",
        source.to_string(),
        syntax_for(Loader::Tsx),
        es_version(EsTarget::Es2022),
      )
      .unwrap();
    scan(&module)
      .dependencies
      .into_iter()
      .map(|word| word.to_string())
      .collect()
  }

  #[test]
  fn collects_specifiers_in_source_order() {
    let deps = scan_source(
      "import a from './a';\nimport { b } from './b';\nexport { c } from './c';\nexport * from './d';",
    );
    assert_eq!(deps, vec!["./a", "./b", "./c", "./d"]);
  }

  #[test]
  fn side_effect_imports_count() {
    let deps = scan_source("import './setup';\nconst x = 1;");
    assert_eq!(deps, vec!["./setup"]);
  }

  #[test]
  fn duplicate_specifiers_collapse() {
    let deps = scan_source("import { a } from './m';\nimport { b } from './m';");
    assert_eq!(deps, vec!["./m"]);
  }
}
