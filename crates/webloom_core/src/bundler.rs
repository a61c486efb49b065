use std::collections::VecDeque;
use std::sync::Arc;

use hashlink::LinkedHashMap;
use rustc_hash::FxHashSet;
use webloom_common::{BuildOptions, CompiledModule, ModuleId};
use webloom_error::Result;
use webloom_runtime_helpers::{
  BOOTSTRAP, ENTRY_ID_SLOT, MODULE_REGISTRY, STYLE_LAYER, STYLE_LAYER_URL_SLOT,
};

use crate::module_compiler::{synthetic_error_module, ModuleCompiler};
use crate::ExternalHandler;

const STYLE_LAYER_URL: &str = "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css";

pub(crate) type OrderedModules = LinkedHashMap<ModuleId, Arc<CompiledModule>>;

/// Breadth-first walk from the entry. Downstream compile failures become
/// synthetic error modules; only the entry itself is allowed to fail the
/// walk.
#[tracing::instrument(skip(compiler))]
pub(crate) async fn walk(
  compiler: &mut ModuleCompiler,
  entry: ModuleId,
  target: webloom_common::EsTarget,
) -> Result<OrderedModules> {
  let mut queue: VecDeque<ModuleId> = VecDeque::from([entry.clone()]);
  let mut visited: FxHashSet<ModuleId> = FxHashSet::default();
  let mut modules: OrderedModules = LinkedHashMap::new();

  while let Some(id) = queue.pop_front() {
    if id.is_external() || !visited.insert(id.clone()) {
      continue;
    }
    match compiler.compile(&id, target).await {
      Ok(compiled) => {
        for dep in &compiled.dependencies {
          if !visited.contains(dep) {
            queue.push_back(dep.clone());
          }
        }
        modules.insert(id, compiled);
      }
      Err(err) if id == entry => {
        return Err(err.context(format!("compile entry {id}")));
      }
      Err(err) => {
        tracing::error!("module {id} failed to build: {err}");
        modules.insert(id.clone(), Arc::new(synthetic_error_module(&id, &err)));
      }
    }
  }

  Ok(modules)
}

/// Concatenate the bundle in its fixed section order: registry stub,
/// external setup, optional style layer, module definitions in discovery
/// order, bootstrap.
pub(crate) fn assemble(
  entry: &ModuleId,
  modules: &OrderedModules,
  externals: &ExternalHandler,
  options: &BuildOptions,
) -> String {
  let mut sections: Vec<String> = vec![];

  sections.push(format!("// bundle for {entry} ({} modules)", modules.len()));
  sections.push("(async function () {".to_string());
  sections.push(MODULE_REGISTRY.to_string());
  sections.push(externals.setup_stub());
  if options.include_style_layer {
    sections.push(STYLE_LAYER.replace(
      STYLE_LAYER_URL_SLOT,
      &serde_json::to_string(STYLE_LAYER_URL).expect("url string is always serializable"),
    ));
  }
  for module in modules.values() {
    sections.push(module.code.clone());
  }
  sections.push(BOOTSTRAP.replace(
    ENTRY_ID_SLOT,
    &serde_json::to_string(entry.id()).expect("id string is always serializable"),
  ));
  sections.push("})();".to_string());

  sections.join("\n")
}
