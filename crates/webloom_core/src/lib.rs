mod bundler;
mod external_handler;
mod host;
mod module_compiler;
mod pipeline;

use rustc_hash::{FxHashMap, FxHashSet};

pub use external_handler::ExternalHandler;
pub use host::{NullHost, RecordingHost, ScriptHost};
pub use module_compiler::ModuleCompiler;
pub use pipeline::{Pipeline, Stats};
pub use webloom_common::{
  BuildOptions, CompiledModule, EsTarget, ExternalLibrary, Loader, ModuleId,
};
pub use webloom_error::{Error as BuildError, Errors, Result as BuildResult};

/// The product of one build: the self-bootstrapping bundle string, the
/// bundled module ids in breadth-first discovery order (entry first), and
/// the direct internal dependency edges between them.
#[derive(Debug)]
pub struct BuildOutput {
  pub bundle: String,
  pub modules: Vec<ModuleId>,
  pub dependency_graph: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
}
