use std::sync::Arc;

use derivative::Derivative;
use rustc_hash::{FxHashMap, FxHashSet};
use webloom_common::{BuildOptions, EsTarget, ExternalLibrary, ModuleId};
use webloom_error::{Error, Errors, Result};
use webloom_fs::SharedFileSystem;
use webloom_resolver::Resolver;

use crate::bundler::{assemble, walk};
use crate::host::{NullHost, ScriptHost};
use crate::module_compiler::ModuleCompiler;
use crate::{BuildOutput, ExternalHandler};

#[derive(Debug)]
pub struct Stats {
  pub modules: usize,
  pub externals: usize,
  pub dependency_graph: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
}

/// The build-and-load pipeline: compile cache, bundle cache, external
/// registry and the host hook for evaluating emitted scripts.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pipeline {
  fs: SharedFileSystem,
  host: Arc<dyn ScriptHost>,
  resolver: Resolver,
  compiler: ModuleCompiler,
  externals: ExternalHandler,
  #[derivative(Debug = "ignore")]
  build_cache: FxHashMap<String, Arc<BuildOutput>>,
  current_target: EsTarget,
  initialized: bool,
}

impl Pipeline {
  pub fn new(fs: SharedFileSystem) -> Self {
    Self::with_host(fs, Arc::new(NullHost))
  }

  pub fn with_host(fs: SharedFileSystem, host: Arc<dyn ScriptHost>) -> Self {
    Self {
      resolver: Resolver::new(fs.clone()),
      compiler: ModuleCompiler::new(fs.clone()),
      fs,
      host,
      externals: ExternalHandler::new(),
      build_cache: FxHashMap::default(),
      current_target: EsTarget::default(),
      initialized: false,
    }
  }

  /// Idempotent. Registers the default externals; `build` calls it on
  /// demand.
  pub fn init(&mut self) {
    if self.initialized {
      return;
    }
    self.externals.register_defaults();
    self.initialized = true;
    tracing::debug!("pipeline initialized with {} default externals", self.externals.len());
  }

  #[tracing::instrument(skip(self))]
  pub async fn build(&mut self, options: &BuildOptions) -> Result<Arc<BuildOutput>> {
    self.init();

    let key = options.cache_key();
    if let Some(hit) = self.build_cache.get(&key) {
      tracing::debug!("build cache hit for {}", options.entry_point);
      return Ok(hit.clone());
    }

    for name in &options.externals {
      self.externals.register(ExternalLibrary::global_only(name.as_str()));
    }
    self.current_target = options.target;

    let entry_path = self.resolver.resolve_entry(&options.entry_point).await?;
    let entry = ModuleId::internal(entry_path);

    let modules = walk(&mut self.compiler, entry.clone(), options.target).await?;
    let bundle = assemble(&entry, &modules, &self.externals, options);

    let graph = self.compiler.graph_snapshot();
    let dependency_graph = modules
      .keys()
      .map(|id| (id.clone(), graph.get(id).cloned().unwrap_or_default()))
      .collect();

    let output = Arc::new(BuildOutput {
      bundle,
      modules: modules.keys().cloned().collect(),
      dependency_graph,
    });
    self.build_cache.insert(key, output.clone());
    Ok(output)
  }

  /// Hand the bundle to the host realm, optionally targeting a container
  /// element by selector.
  pub async fn execute_and_render(
    &self,
    output: &BuildOutput,
    container: Option<&str>,
  ) -> Result<()> {
    let mut script = String::new();
    if let Some(selector) = container {
      let selector = serde_json::to_string(selector)
        .map_err(|err| Error::transform("<container>", err.to_string()))?;
      script.push_str(&format!(
        "globalThis.__container = document.querySelector({selector});\n"
      ));
    }
    script.push_str(&output.bundle);
    self.host.eval(&script).await
  }

  /// Drop one module (and everything that depends on it) from the compile
  /// cache, and conservatively drop every cached build with it.
  pub fn invalidate_module(&mut self, id: &str) -> Vec<ModuleId> {
    let dropped = self.compiler.invalidate(&ModuleId::internal(id));
    self.build_cache.clear();
    dropped
  }

  /// Invalidate one module (and its reverse dependents), recompile just that
  /// module, and install its fresh `define` in the host realm. The caller
  /// decides when to re-`require`.
  #[tracing::instrument(skip(self))]
  pub async fn hot_reload(&mut self, id: &str) -> Result<String> {
    let module_id = ModuleId::internal(id);
    let dropped = self.invalidate_module(id);
    tracing::debug!("hot reload of {id} invalidated {} modules", dropped.len());

    let compiled = self.compiler.compile(&module_id, self.current_target).await?;
    let id_json = serde_json::to_string(id)
      .map_err(|err| Error::transform(id, err.to_string()))?;
    let script = format!(
      "(function (global) {{\n  if (global.__moduleRegistry) {{\n    global.__moduleRegistry.delete({id_json});\n  }}\n}})(globalThis);\n{}",
      compiled.code
    );
    self.host.eval(&script).await?;
    Ok(script)
  }

  pub fn clear_cache(&mut self) {
    self.compiler.clear();
    self.build_cache.clear();
    tracing::debug!("caches cleared");
  }

  pub fn stats(&self) -> Stats {
    Stats {
      modules: self.compiler.cached_modules(),
      externals: self.externals.len(),
      dependency_graph: self.compiler.graph_snapshot(),
    }
  }

  pub fn externals(&self) -> &ExternalHandler {
    &self.externals
  }

  pub fn filesystem(&self) -> &SharedFileSystem {
    &self.fs
  }

  pub fn take_warnings(&mut self) -> Errors {
    self.compiler.take_warnings()
  }
}
