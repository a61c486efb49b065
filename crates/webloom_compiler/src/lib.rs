use std::path::PathBuf;

use once_cell::sync::Lazy;
use swc_core::common::comments::Comments;
use swc_core::common::pass::Optional;
use swc_core::common::sync::Lrc;
use swc_core::common::{chain, FileName, Mark, SourceFile, SourceMap, GLOBALS};
use swc_core::ecma::ast::{self, EsVersion};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{self, Emitter};
use swc_core::ecma::parser::{lexer::Lexer, EsConfig, Parser, StringInput, Syntax, TsConfig};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::helpers::{inject_helpers, HELPERS};
use swc_core::ecma::transforms::base::hygiene::hygiene;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::transforms::proposal::decorators;
use swc_core::ecma::transforms::react;
use swc_core::ecma::transforms::typescript;
use swc_core::ecma::visit::FoldWith;
use swc_node_comments::SwcComments;
use webloom_common::{EsTarget, Loader};
use webloom_error::{Error, Result};

pub static COMPILER: Lazy<Compiler> = Lazy::new(Compiler::new);

/// Thin facade over swc: one shared source map, parse, print, and the
/// TS/JSX-to-ES transform chain. Nothing outside this crate reaches into
/// swc's transform pipeline.
pub struct Compiler {
  pub cm: Lrc<SourceMap>,
}

impl Default for Compiler {
  fn default() -> Self {
    Self::new()
  }
}

impl Compiler {
  pub fn new() -> Self {
    Self {
      cm: Default::default(),
    }
  }

  pub fn create_source_file(&self, path: PathBuf, source: String) -> Lrc<SourceFile> {
    self.cm.new_source_file(FileName::Real(path), source)
  }

  pub fn parse(
    &self,
    fm: &Lrc<SourceFile>,
    syntax: Syntax,
    target: EsVersion,
    comments: Option<&dyn Comments>,
  ) -> Result<ast::Module> {
    let lexer = Lexer::new(syntax, target, StringInput::from(&**fm), comments);
    let mut parser = Parser::new_from(lexer);
    let module = parser
      .parse_module()
      .map_err(|err| Error::parse(fm.name.to_string(), err.kind().msg().to_string()))?;
    // the parser recovers from some syntax errors; treat those as failures
    // too so a module never compiles from a half-understood AST
    if let Some(err) = parser.take_errors().into_iter().next() {
      return Err(Error::parse(
        fm.name.to_string(),
        err.kind().msg().to_string(),
      ));
    }
    Ok(module)
  }

  /// Parse a standalone source string without registering comments.
  pub fn parse_str(
    &self,
    id: &str,
    source: String,
    syntax: Syntax,
    target: EsVersion,
  ) -> Result<ast::Module> {
    let fm = self.create_source_file(PathBuf::from(id), source);
    self.parse(&fm, syntax, target, None)
  }

  pub fn print(&self, module: &ast::Module) -> Result<String> {
    let mut buf = vec![];
    {
      let mut emitter = Emitter {
        cfg: codegen::Config::default(),
        cm: self.cm.clone(),
        comments: None,
        wr: JsWriter::new(self.cm.clone(), "\n", &mut buf, None),
      };
      emitter.emit_module(module).map_err(Error::io_error)?;
    }
    String::from_utf8(buf).map_err(|err| Error::transform("<codegen>", err.to_string()))
  }
}

/// Parse one source unit with the syntax its loader implies.
pub fn parse_source(
  id: &str,
  source: String,
  loader: Loader,
  target: EsTarget,
) -> Result<ast::Module> {
  COMPILER.parse_str(id, source, syntax_for(loader), es_version(target))
}

/// Print an AST back to JavaScript through the shared source map.
pub fn print(module: &ast::Module) -> Result<String> {
  COMPILER.print(module)
}

pub fn syntax_for(loader: Loader) -> Syntax {
  if loader.is_typescript() {
    Syntax::Typescript(TsConfig {
      tsx: loader.is_jsx(),
      decorators: true,
      ..Default::default()
    })
  } else {
    Syntax::Es(EsConfig {
      jsx: loader.is_jsx(),
      ..Default::default()
    })
  }
}

pub fn es_version(target: EsTarget) -> EsVersion {
  match target {
    EsTarget::Es2015 => EsVersion::Es2015,
    EsTarget::Es2020 => EsVersion::Es2020,
    EsTarget::Es2022 => EsVersion::Es2022,
  }
}

/// Lower TS/TSX/JSX to plain ES. Module syntax (`import`/`export`) survives
/// untouched; rewriting those is the module compiler's job.
pub fn transpile(id: &str, source: String, loader: Loader, target: EsTarget) -> Result<String> {
  let is_ts = matches!(loader, Loader::Ts);
  let is_tsx = matches!(loader, Loader::Tsx);
  let is_ts_or_tsx = loader.is_typescript();
  let is_jsx_or_tsx = loader.is_jsx();

  let comments = SwcComments::default();
  let fm = COMPILER.create_source_file(PathBuf::from(id), source);
  let ast = COMPILER
    .parse(&fm, syntax_for(loader), es_version(target), Some(&comments))
    .map_err(|err| Error::transform(id, err.to_string()))?;

  let ast = GLOBALS.set(&Default::default(), || {
    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();
    let mut folders = chain!(
      Optional {
        enabled: is_ts_or_tsx,
        visitor: decorators::decorators(decorators::Config {
          use_define_for_class_fields: false,
          ..Default::default()
        }),
      },
      Optional {
        enabled: is_ts_or_tsx,
        visitor: resolver(unresolved_mark, top_level_mark, is_ts_or_tsx),
      },
      Optional {
        enabled: is_ts,
        visitor: typescript::strip_with_config(
          typescript::Config {
            ..Default::default()
          },
          top_level_mark
        ),
      },
      Optional {
        enabled: is_tsx,
        visitor: typescript::strip_with_jsx(
          COMPILER.cm.clone(),
          typescript::Config {
            ..Default::default()
          },
          &comments,
          top_level_mark
        ),
      },
      Optional {
        enabled: is_jsx_or_tsx,
        visitor: react::react(
          COMPILER.cm.clone(),
          Some(&comments),
          react::Options {
            ..Default::default()
          },
          top_level_mark
        )
      },
      Optional {
        enabled: is_ts_or_tsx,
        visitor: hygiene(),
      },
      Optional {
        enabled: is_ts_or_tsx,
        visitor: fixer(None),
      },
      Optional {
        enabled: is_ts_or_tsx,
        visitor: inject_helpers(unresolved_mark),
      }
    );

    HELPERS.set(&Default::default(), || ast.fold_with(&mut folders))
  });

  COMPILER.print(&ast)
}
