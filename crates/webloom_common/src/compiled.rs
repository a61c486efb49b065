use crate::ModuleId;

/// The cached output of compiling one source unit: the complete
/// `define('<id>', [deps], factory)` string plus the resolved internal
/// dependency list in first-occurrence order. External specifiers never
/// appear here; they are resolved at runtime through the external registry.
#[derive(Debug, Clone)]
pub struct CompiledModule {
  pub id: ModuleId,
  pub code: String,
  pub dependencies: Vec<ModuleId>,
  pub source_map: Option<String>,
}
