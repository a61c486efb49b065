mod compiled;
mod external;
mod loader;
mod module_id;
mod options;

pub use compiled::CompiledModule;
pub use external::ExternalLibrary;
pub use loader::Loader;
pub use module_id::{is_bare_specifier, ModuleId};
pub use options::{BuildOptions, EsTarget};
