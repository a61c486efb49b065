use std::sync::Arc;

use derivative::Derivative;
use hashlink::LinkedHashMap;
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use webloom_common::{is_bare_specifier, CompiledModule, EsTarget, Loader, ModuleId};
use webloom_error::{Error, Errors, Result};
use webloom_fs::SharedFileSystem;
use webloom_resolver::Resolver;
use webloom_swc_visitors::{ImportBinding, LowerResult};

/// What a source specifier resolved to.
#[derive(Debug, Clone)]
enum ResolvedSpecifier {
  Internal(ModuleId),
  External(String),
  /// No filesystem match; the canonicalized guess is kept so the failure
  /// surfaces as `ModuleNotFound` at runtime.
  Unresolved(String),
}

/// Per-module compiler with a memoizing cache and the direct-dependency
/// graph used for transitive invalidation.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ModuleCompiler {
  fs: SharedFileSystem,
  resolver: Resolver,
  #[derivative(Debug = "ignore")]
  cache: FxHashMap<ModuleId, Arc<CompiledModule>>,
  graph: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
  warnings: Errors,
}

impl ModuleCompiler {
  pub fn new(fs: SharedFileSystem) -> Self {
    Self {
      resolver: Resolver::new(fs.clone()),
      fs,
      cache: FxHashMap::default(),
      graph: FxHashMap::default(),
      warnings: Errors::default(),
    }
  }

  #[tracing::instrument(skip(self))]
  pub async fn compile(&mut self, id: &ModuleId, target: EsTarget) -> Result<Arc<CompiledModule>> {
    debug_assert!(!id.is_external(), "externals are never compiled: {id:?}");

    if let Some(hit) = self.cache.get(id) {
      tracing::debug!("compile cache hit for {id}");
      return Ok(hit.clone());
    }

    let source = self
      .fs
      .read_file(id.id())
      .await
      .map_err(|err| err.context(format!("read source of {id}")))?;

    let loader = Loader::from_path(id.id());
    let compiled = if loader.is_css() {
      compile_css(id, &source)
    } else {
      self.compile_js(id, source, loader, target).await?
    };

    let compiled = Arc::new(compiled);
    self
      .graph
      .insert(id.clone(), compiled.dependencies.iter().cloned().collect());
    self.cache.insert(id.clone(), compiled.clone());
    Ok(compiled)
  }

  async fn compile_js(
    &mut self,
    id: &ModuleId,
    source: String,
    loader: Loader,
    target: EsTarget,
  ) -> Result<CompiledModule> {
    // Dependency extraction works on the raw source; the transform may drop
    // type-only imports later, but the graph is decided here.
    let mut dependencies: Vec<ModuleId> = vec![];
    let mut resolved: FxHashMap<String, ResolvedSpecifier> = FxHashMap::default();

    match webloom_compiler::parse_source(id.id(), source.clone(), loader, target) {
      Ok(raw) => {
        let scanned = webloom_swc_visitors::scan(&raw);
        let resolutions =
          futures::future::join_all(scanned.dependencies.iter().map(|specifier| {
            let specifier = specifier.to_string();
            let resolver = &self.resolver;
            async move {
              if is_bare_specifier(&specifier) {
                (specifier.clone(), Ok(None))
              } else {
                let outcome = resolver.resolve(Some(id), &specifier).await;
                (specifier, outcome.map(Some))
              }
            }
          }))
          .await;

        for (specifier, outcome) in resolutions {
          let entry = match outcome? {
            None => ResolvedSpecifier::External(specifier.clone()),
            Some(Some(path)) => {
              let dep = ModuleId::internal(path);
              if !dependencies.contains(&dep) {
                dependencies.push(dep.clone());
              }
              ResolvedSpecifier::Internal(dep)
            }
            Some(None) => {
              self.warn(Error::unresolved_specifier(id.id(), &*specifier));
              ResolvedSpecifier::Unresolved(Resolver::canonicalize(Some(id), &specifier))
            }
          };
          resolved.insert(specifier, entry);
        }
      }
      Err(err) => {
        // Recoverable: the module ships with an empty dependency list.
        self.warn(err.context(format!("dependency extraction for {id}")));
      }
    }

    let transpiled = webloom_compiler::transpile(id.id(), source, loader, target)?;

    let (preamble, body, epilogue) =
      match webloom_compiler::parse_source(id.id(), transpiled.clone(), Loader::Js, target) {
        Ok(module) => {
          let (module, lowered) = webloom_swc_visitors::lower(module);
          let body = webloom_compiler::print(&module)?;
          let mut requires = RequirePreamble::new(id, &resolved);
          let preamble = render_preamble(&lowered, &mut requires);
          let epilogue = render_epilogue(&lowered, &mut requires);
          (preamble, body, epilogue)
        }
        Err(err) => {
          // Wrap the transformed code as-is; imports stay and fail at
          // evaluation time, which beats dropping the module entirely.
          self.warn(err.context(format!("rewriting transformed code of {id}")));
          (String::new(), transpiled, String::new())
        }
      };

    Ok(CompiledModule {
      id: id.clone(),
      code: wrap_define(id, &dependencies, &preamble, &body, &epilogue),
      dependencies,
      source_map: None,
    })
  }

  /// Drop `id` and, transitively, everything that depends on it. Returns the
  /// dropped ids.
  pub fn invalidate(&mut self, id: &ModuleId) -> Vec<ModuleId> {
    let mut dropped: FxHashSet<ModuleId> = FxHashSet::default();
    dropped.insert(id.clone());
    loop {
      let mut grew = false;
      for (module, deps) in &self.graph {
        if !dropped.contains(module) && deps.iter().any(|dep| dropped.contains(dep)) {
          dropped.insert(module.clone());
          grew = true;
        }
      }
      if !grew {
        break;
      }
    }

    for module in &dropped {
      self.cache.remove(module);
      self.graph.remove(module);
    }
    let dropped = dropped.into_iter().sorted().collect_vec();
    tracing::debug!("invalidated {dropped:?}");
    dropped
  }

  pub fn clear(&mut self) {
    self.cache.clear();
    self.graph.clear();
    self.warnings = Errors::default();
  }

  pub fn cached_modules(&self) -> usize {
    self.cache.len()
  }

  pub fn graph_snapshot(&self) -> FxHashMap<ModuleId, FxHashSet<ModuleId>> {
    self.graph.clone()
  }

  pub fn take_warnings(&mut self) -> Errors {
    std::mem::take(&mut self.warnings)
  }

  fn warn(&mut self, err: Error) {
    tracing::warn!("{}", err.to_pretty_string());
    self.warnings.push(err);
  }
}

/// Emits one `const __<slug> = require('<id>');` line per distinct
/// specifier and remembers the binding name for later lookups.
struct RequirePreamble<'a> {
  importer: &'a ModuleId,
  resolved: &'a FxHashMap<String, ResolvedSpecifier>,
  lines: Vec<String>,
  bindings: LinkedHashMap<String, String>,
}

impl<'a> RequirePreamble<'a> {
  fn new(importer: &'a ModuleId, resolved: &'a FxHashMap<String, ResolvedSpecifier>) -> Self {
    Self {
      importer,
      resolved,
      lines: vec![],
      bindings: LinkedHashMap::new(),
    }
  }

  /// Binding name for a specifier, emitting the `require` line the first
  /// time the specifier is seen.
  fn require(&mut self, specifier: &str) -> String {
    if let Some(binding) = self.bindings.get(specifier) {
      return binding.clone();
    }
    let target = match self.resolved.get(specifier) {
      Some(ResolvedSpecifier::Internal(id)) => id.id().to_string(),
      Some(ResolvedSpecifier::External(name)) => name.clone(),
      Some(ResolvedSpecifier::Unresolved(path)) => path.clone(),
      // the re-parse saw a specifier the raw parse did not; keep the best guess
      None => Resolver::canonicalize(Some(self.importer), specifier),
    };
    let binding = format!("__{}", ModuleId::new(&*target, false).slug());
    self
      .lines
      .push(format!("const {binding} = require({});", json_str(&target)));
    self
      .bindings
      .insert(specifier.to_string(), binding.clone());
    binding
  }
}

fn render_preamble(lowered: &LowerResult, requires: &mut RequirePreamble<'_>) -> String {
  for import in &lowered.imports {
    let binding = requires.require(&import.specifier);
    for spec in &import.bindings {
      let line = match spec {
        ImportBinding::Default { local } => {
          format!("const {local} = {binding}.default ?? {binding};")
        }
        ImportBinding::Named { local, imported } => {
          format!("const {local} = {};", member(&binding, imported))
        }
        ImportBinding::Namespace { local } => format!("const {local} = {binding};"),
      };
      requires.lines.push(line);
    }
  }
  // re-exports need their sources required up front as well
  for reexport in &lowered.reexports {
    requires.require(&reexport.specifier);
  }
  for specifier in &lowered.star_reexports {
    requires.require(specifier);
  }

  requires.lines.join("\n")
}

fn render_epilogue(lowered: &LowerResult, requires: &mut RequirePreamble<'_>) -> String {
  let mut entries: Vec<String> = vec![];

  for export in &lowered.exports {
    entries.push(format!("{}: {}", prop_key(&export.exported), export.local));
  }
  for reexport in &lowered.reexports {
    let binding = requires.require(&reexport.specifier);
    for spec in &reexport.bindings {
      let value = match &spec.imported {
        Some(imported) => member(&binding, imported),
        None => binding.clone(),
      };
      entries.push(format!("{}: {}", prop_key(&spec.exported), value));
    }
  }
  if !lowered.has_explicit_exports() {
    if let Some(name) = &lowered.fallback_default {
      entries.push(format!("default: {name}"));
    }
  }

  let literal = if entries.is_empty() {
    "{}".to_string()
  } else {
    format!("{{ {} }}", entries.join(", "))
  };

  if lowered.star_reexports.is_empty() {
    format!("module.exports = {literal};")
  } else {
    let stars = lowered
      .star_reexports
      .iter()
      .map(|specifier| requires.require(specifier))
      .join(", ");
    format!("module.exports = Object.assign({{}}, {stars}, {literal});")
  }
}

fn wrap_define(
  id: &ModuleId,
  dependencies: &[ModuleId],
  preamble: &str,
  body: &str,
  epilogue: &str,
) -> String {
  let deps = dependencies.iter().map(|dep| json_str(dep.id())).join(", ");
  let mut out = format!(
    "define({}, [{deps}], function(require, module, exports) {{\n",
    json_str(id.id())
  );
  for section in [preamble, body, epilogue] {
    let section = section.trim_end();
    if !section.is_empty() {
      out.push_str(section);
      out.push('\n');
    }
  }
  out.push_str("});");
  out
}

/// CSS modules compile to a factory that maintains one
/// `<style data-module="<id>">` element and exports the raw text.
fn compile_css(id: &ModuleId, source: &str) -> CompiledModule {
  let id_json = json_str(id.id());
  let css_json = json_str(source);
  let code = format!(
    r#"define({id_json}, [], function(require, module, exports) {{
const moduleId = {id_json};
const css = {css_json};
if (typeof document !== "undefined") {{
  let el = document.querySelector('style[data-module="' + moduleId + '"]');
  if (!el) {{
    el = document.createElement("style");
    el.setAttribute("data-module", moduleId);
    document.head.appendChild(el);
  }}
  el.textContent = css;
}}
module.exports = css;
}});"#
  );
  CompiledModule {
    id: id.clone(),
    code,
    dependencies: vec![],
    source_map: None,
  }
}

/// A module that failed to build still occupies its slot in the bundle so
/// the rest of the app can mount; its factory logs and renders nothing.
pub(crate) fn synthetic_error_module(id: &ModuleId, err: &Error) -> CompiledModule {
  let code = format!(
    "define({id}, [], function(require, module, exports) {{\n\
     console.error(\"[bundle] module failed to build:\", {id}, {msg});\n\
     module.exports = {{ default: () => null }};\n\
     }});",
    id = json_str(id.id()),
    msg = json_str(&err.to_string())
  );
  CompiledModule {
    id: id.clone(),
    code,
    dependencies: vec![],
    source_map: None,
  }
}

fn json_str(s: &str) -> String {
  serde_json::to_string(s).expect("strings are always serializable")
}

fn is_js_ident(name: &str) -> bool {
  let mut chars = name.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn member(binding: &str, prop: &str) -> String {
  if is_js_ident(prop) {
    format!("{binding}.{prop}")
  } else {
    format!("{binding}[{}]", json_str(prop))
  }
}

fn prop_key(name: &str) -> String {
  if is_js_ident(name) {
    name.to_string()
  } else {
    json_str(name)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use webloom_fs::{FileSystem, MemoryFileSystem};

  use super::*;

  async fn compiler_with(files: &[(&str, &str)]) -> ModuleCompiler {
    let fs = MemoryFileSystem::new();
    for (path, contents) in files {
      fs.write_file(path, contents).await.unwrap();
    }
    ModuleCompiler::new(Arc::new(fs))
  }

  async fn compile_one(files: &[(&str, &str)], id: &str) -> Arc<CompiledModule> {
    let mut compiler = compiler_with(files).await;
    compiler
      .compile(&ModuleId::internal(id), EsTarget::Es2022)
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn default_import_lowers_to_the_nullish_pattern() {
    let compiled = compile_one(
      &[
        ("/a.ts", "import b from './b';\nexport const wrapped = b;"),
        ("/b.ts", "export default 1;"),
      ],
      "/a.ts",
    )
    .await;
    assert!(compiled.code.contains("const ___b_ts = require(\"/b.ts\");"));
    assert!(compiled.code.contains("const b = ___b_ts.default ?? ___b_ts;"));
    assert_eq!(compiled.dependencies, vec![ModuleId::internal("/b.ts")]);
  }

  #[tokio::test]
  async fn named_and_namespace_imports_bind_members() {
    let compiled = compile_one(
      &[
        (
          "/a.ts",
          "import { one, two as alias } from './m';\nimport * as ns from './m';\nexport const all = [one, alias, ns];",
        ),
        ("/m.ts", "export const one = 1;\nexport const two = 2;"),
      ],
      "/a.ts",
    )
    .await;
    assert!(compiled.code.contains("const one = ___m_ts.one;"));
    assert!(compiled.code.contains("const alias = ___m_ts.two;"));
    assert!(compiled.code.contains("const ns = ___m_ts;"));
    // one require line for two import statements of the same module
    assert_eq!(compiled.code.matches("require(\"/m.ts\")").count(), 1);
  }

  #[tokio::test]
  async fn external_imports_stay_out_of_the_dependency_array() {
    let compiled = compile_one(
      &[("/app.tsx", "import React from 'react';\nexport default function App() { return React.createElement('div'); }")],
      "/app.tsx",
    )
    .await;
    assert!(compiled.dependencies.is_empty());
    assert!(compiled.code.starts_with("define(\"/app.tsx\", [],"));
    assert!(compiled.code.contains("const __react = require(\"react\");"));
    assert!(compiled.code.contains("const React = __react.default ?? __react;"));
  }

  #[tokio::test]
  async fn unresolved_specifiers_keep_a_runtime_require_but_no_edge() {
    let mut compiler = compiler_with(&[("/a.ts", "import x from './missing';\nexport const y = x;")]).await;
    let compiled = compiler
      .compile(&ModuleId::internal("/a.ts"), EsTarget::Es2022)
      .await
      .unwrap();
    assert!(compiled.dependencies.is_empty());
    assert!(compiled.code.contains("require(\"/missing\")"));
    let warnings = compiler.take_warnings().into_vec();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code(), "UNRESOLVED_SPECIFIER");
  }

  #[tokio::test]
  async fn module_without_exports_falls_back_to_first_binding() {
    let compiled = compile_one(
      &[("/util.ts", "const first = 1;\nfunction helper() {}\n")],
      "/util.ts",
    )
    .await;
    assert!(compiled.code.contains("module.exports = { default: first };"));
  }

  #[tokio::test]
  async fn module_with_nothing_to_export_exports_an_empty_object() {
    let compiled = compile_one(&[("/side.ts", "console.log('hi');")], "/side.ts").await;
    assert!(compiled.code.contains("module.exports = {};"));
  }

  #[tokio::test]
  async fn star_reexports_merge_through_object_assign() {
    let compiled = compile_one(
      &[
        ("/barrel.ts", "export * from './a';\nexport const own = 1;"),
        ("/a.ts", "export const x = 1;"),
      ],
      "/barrel.ts",
    )
    .await;
    assert!(compiled
      .code
      .contains("module.exports = Object.assign({}, ___a_ts, { own: own });"));
  }

  #[tokio::test]
  async fn css_modules_wrap_the_raw_text() {
    let compiled = compile_one(&[("/g.css", "body{color:red}")], "/g.css").await;
    assert!(compiled.dependencies.is_empty());
    assert!(compiled.code.contains("define(\"/g.css\", [],"));
    assert!(compiled.code.contains("\"body{color:red}\""));
    assert!(compiled.code.contains("style[data-module="));
    assert!(compiled.code.contains("module.exports = css;"));
  }

  #[tokio::test]
  async fn compile_is_memoized_until_invalidated() {
    let mut compiler = compiler_with(&[("/a.ts", "export const v = 1;")]).await;
    let id = ModuleId::internal("/a.ts");
    let first = compiler.compile(&id, EsTarget::Es2022).await.unwrap();
    let second = compiler.compile(&id, EsTarget::Es2022).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    compiler.invalidate(&id);
    let third = compiler.compile(&id, EsTarget::Es2022).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
  }

  #[tokio::test]
  async fn invalidation_walks_the_reverse_graph() {
    let mut compiler = compiler_with(&[
      ("/a.ts", "import { b } from './b';\nexport const a = b;"),
      ("/b.ts", "import { c } from './c';\nexport const b = c;"),
      ("/c.ts", "export const c = 1;"),
      ("/lone.ts", "export const lone = 1;"),
    ])
    .await;
    for id in ["/a.ts", "/b.ts", "/c.ts", "/lone.ts"] {
      compiler
        .compile(&ModuleId::internal(id), EsTarget::Es2022)
        .await
        .unwrap();
    }
    let dropped = compiler.invalidate(&ModuleId::internal("/c.ts"));
    assert_eq!(
      dropped,
      vec![
        ModuleId::internal("/a.ts"),
        ModuleId::internal("/b.ts"),
        ModuleId::internal("/c.ts"),
      ]
    );
    assert_eq!(compiler.cached_modules(), 1);
  }

  #[tokio::test]
  async fn read_failures_propagate() {
    let mut compiler = compiler_with(&[]).await;
    let err = compiler
      .compile(&ModuleId::internal("/absent.ts"), EsTarget::Es2022)
      .await
      .unwrap_err();
    assert_eq!(err.code(), "FILESYSTEM_ERROR");
  }

  #[tokio::test]
  async fn broken_syntax_is_a_transform_error() {
    let mut compiler = compiler_with(&[("/bad.ts", "const = ;")]).await;
    let err = compiler
      .compile(&ModuleId::internal("/bad.ts"), EsTarget::Es2022)
      .await
      .unwrap_err();
    assert_eq!(err.code(), "TRANSFORM_ERROR");
    // the failed dependency scan was recorded as a recoverable warning
    let warnings = compiler.take_warnings();
    assert!(warnings.iter().any(|w| w.code() == "PARSE_ERROR"));
  }

  #[test]
  fn synthetic_error_modules_render_nothing() {
    let module = synthetic_error_module(
      &ModuleId::internal("/broken.tsx"),
      &Error::unresolved_entry("/broken.tsx"),
    );
    assert!(module.code.contains("define(\"/broken.tsx\", [],"));
    assert!(module.code.contains("default: () => null"));
    assert!(module.code.contains("console.error"));
  }
}
