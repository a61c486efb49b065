use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{
  self, BindingIdent, Decl, DefaultDecl, Expr, Ident, ModuleDecl, ModuleExportName, ModuleItem,
  Pat, Stmt, VarDecl, VarDeclKind, VarDeclarator,
};
use swc_core::ecma::atoms::JsWord;

const SYNTHETIC_DEFAULT: &str = "__default_export";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
  Default { local: JsWord },
  Named { local: JsWord, imported: JsWord },
  Namespace { local: JsWord },
}

/// One `import ... from '<specifier>'` statement. Side-effect imports carry
/// no bindings.
#[derive(Debug, Clone)]
pub struct LoweredImport {
  pub specifier: JsWord,
  pub bindings: Vec<ImportBinding>,
}

/// A name this module exports, bound to a local identifier left in the body.
#[derive(Debug, Clone)]
pub struct LocalExport {
  pub exported: JsWord,
  pub local: JsWord,
}

/// One binding of an `export { ... } from '<specifier>'` statement.
/// `imported: None` re-exports the whole namespace (`export * as ns`).
#[derive(Debug, Clone)]
pub struct ReexportBinding {
  pub exported: JsWord,
  pub imported: Option<JsWord>,
}

#[derive(Debug, Clone)]
pub struct LoweredReexport {
  pub specifier: JsWord,
  pub bindings: Vec<ReexportBinding>,
}

#[derive(Debug, Default)]
pub struct LowerResult {
  pub imports: Vec<LoweredImport>,
  pub exports: Vec<LocalExport>,
  pub reexports: Vec<LoweredReexport>,
  pub star_reexports: Vec<JsWord>,
  /// First top-level binding, the default export of last resort for modules
  /// that declare no exports at all.
  pub fallback_default: Option<JsWord>,
}

impl LowerResult {
  pub fn has_explicit_exports(&self) -> bool {
    !self.exports.is_empty() || !self.reexports.is_empty() || !self.star_reexports.is_empty()
  }
}

/// Strip every module declaration out of the AST, unwrapping export
/// declarations to the statements they carry, and report what was removed.
/// The caller turns the report into a `require` preamble and a
/// `module.exports` epilogue around the printed body.
pub fn lower(module: ast::Module) -> (ast::Module, LowerResult) {
  let ast::Module {
    span,
    body: items,
    shebang,
  } = module;

  let mut result = LowerResult::default();
  let mut body: Vec<ModuleItem> = Vec::with_capacity(items.len());

  for item in items {
    match item {
      ModuleItem::ModuleDecl(decl) => match decl {
        ModuleDecl::Import(import) => {
          let bindings = import
            .specifiers
            .iter()
            .filter_map(import_binding)
            .collect();
          result.imports.push(LoweredImport {
            specifier: import.src.value.clone(),
            bindings,
          });
        }
        ModuleDecl::ExportDecl(export) => {
          for name in decl_names(&export.decl) {
            result.exports.push(LocalExport {
              exported: name.clone(),
              local: name,
            });
          }
          body.push(ModuleItem::Stmt(Stmt::Decl(export.decl)));
        }
        ModuleDecl::ExportDefaultDecl(export) => match export.decl {
          DefaultDecl::Fn(fn_expr) => {
            let local = match fn_expr.ident.clone() {
              Some(ident) => {
                let sym = ident.sym.clone();
                body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(ast::FnDecl {
                  ident,
                  declare: false,
                  function: fn_expr.function,
                }))));
                sym
              }
              None => {
                let ident = synthetic_default_ident();
                let sym = ident.sym.clone();
                body.push(const_binding(ident, Expr::Fn(fn_expr)));
                sym
              }
            };
            result.exports.push(LocalExport {
              exported: "default".into(),
              local,
            });
          }
          DefaultDecl::Class(class_expr) => {
            let local = match class_expr.ident.clone() {
              Some(ident) => {
                let sym = ident.sym.clone();
                body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Class(ast::ClassDecl {
                  ident,
                  declare: false,
                  class: class_expr.class,
                }))));
                sym
              }
              None => {
                let ident = synthetic_default_ident();
                let sym = ident.sym.clone();
                body.push(const_binding(ident, Expr::Class(class_expr)));
                sym
              }
            };
            result.exports.push(LocalExport {
              exported: "default".into(),
              local,
            });
          }
          // type-only, nothing survives into the output
          DefaultDecl::TsInterfaceDecl(_) => {}
        },
        ModuleDecl::ExportDefaultExpr(export) => {
          let ident = synthetic_default_ident();
          let sym = ident.sym.clone();
          body.push(const_binding(ident, *export.expr));
          result.exports.push(LocalExport {
            exported: "default".into(),
            local: sym,
          });
        }
        ModuleDecl::ExportNamed(named) => match &named.src {
          Some(src) => {
            let bindings = named
              .specifiers
              .iter()
              .filter_map(reexport_binding)
              .collect();
            result.reexports.push(LoweredReexport {
              specifier: src.value.clone(),
              bindings,
            });
          }
          None => {
            for spec in &named.specifiers {
              if let ast::ExportSpecifier::Named(spec) = spec {
                if let ModuleExportName::Ident(orig) = &spec.orig {
                  let exported = spec
                    .exported
                    .as_ref()
                    .map(export_name_atom)
                    .unwrap_or_else(|| orig.sym.clone());
                  result.exports.push(LocalExport {
                    exported,
                    local: orig.sym.clone(),
                  });
                }
              }
            }
          }
        },
        ModuleDecl::ExportAll(all) => {
          result.star_reexports.push(all.src.value.clone());
        }
        ModuleDecl::TsImportEquals(_)
        | ModuleDecl::TsExportAssignment(_)
        | ModuleDecl::TsNamespaceExport(_) => {}
      },
      ModuleItem::Stmt(stmt) => body.push(ModuleItem::Stmt(stmt)),
    }
  }

  if !result.has_explicit_exports() {
    result.fallback_default = first_top_level_binding(&body);
  }

  (
    ast::Module {
      span,
      body,
      shebang,
    },
    result,
  )
}

fn import_binding(spec: &ast::ImportSpecifier) -> Option<ImportBinding> {
  match spec {
    ast::ImportSpecifier::Default(spec) => Some(ImportBinding::Default {
      local: spec.local.sym.clone(),
    }),
    ast::ImportSpecifier::Named(spec) => {
      let imported = spec
        .imported
        .as_ref()
        .map(export_name_atom)
        .unwrap_or_else(|| spec.local.sym.clone());
      Some(ImportBinding::Named {
        local: spec.local.sym.clone(),
        imported,
      })
    }
    ast::ImportSpecifier::Namespace(spec) => Some(ImportBinding::Namespace {
      local: spec.local.sym.clone(),
    }),
  }
}

fn reexport_binding(spec: &ast::ExportSpecifier) -> Option<ReexportBinding> {
  match spec {
    ast::ExportSpecifier::Named(spec) => {
      let imported = export_name_atom(&spec.orig);
      let exported = spec
        .exported
        .as_ref()
        .map(export_name_atom)
        .unwrap_or_else(|| imported.clone());
      Some(ReexportBinding {
        exported,
        imported: Some(imported),
      })
    }
    ast::ExportSpecifier::Namespace(spec) => Some(ReexportBinding {
      exported: export_name_atom(&spec.name),
      imported: None,
    }),
    ast::ExportSpecifier::Default(spec) => Some(ReexportBinding {
      exported: spec.exported.sym.clone(),
      imported: Some("default".into()),
    }),
  }
}

fn export_name_atom(name: &ModuleExportName) -> JsWord {
  match name {
    ModuleExportName::Ident(ident) => ident.sym.clone(),
    ModuleExportName::Str(s) => s.value.clone(),
  }
}

fn synthetic_default_ident() -> Ident {
  Ident::new(SYNTHETIC_DEFAULT.into(), DUMMY_SP)
}

fn const_binding(ident: Ident, init: Expr) -> ModuleItem {
  ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
    span: DUMMY_SP,
    kind: VarDeclKind::Const,
    declare: false,
    decls: vec![VarDeclarator {
      span: DUMMY_SP,
      name: Pat::Ident(BindingIdent {
        id: ident,
        type_ann: None,
      }),
      init: Some(Box::new(init)),
      definite: false,
    }],
  }))))
}

fn decl_names(decl: &Decl) -> Vec<JsWord> {
  match decl {
    Decl::Fn(f) => vec![f.ident.sym.clone()],
    Decl::Class(c) => vec![c.ident.sym.clone()],
    Decl::Var(v) => v.decls.iter().flat_map(|d| pat_idents(&d.name)).collect(),
    _ => vec![],
  }
}

fn pat_idents(pat: &Pat) -> Vec<JsWord> {
  match pat {
    Pat::Ident(ident) => vec![ident.id.sym.clone()],
    Pat::Array(array) => array
      .elems
      .iter()
      .flatten()
      .flat_map(pat_idents)
      .collect(),
    Pat::Object(object) => object
      .props
      .iter()
      .flat_map(|prop| match prop {
        ast::ObjectPatProp::KeyValue(kv) => pat_idents(&kv.value),
        ast::ObjectPatProp::Assign(assign) => vec![assign.key.sym.clone()],
        ast::ObjectPatProp::Rest(rest) => pat_idents(&rest.arg),
      })
      .collect(),
    Pat::Assign(assign) => pat_idents(&assign.left),
    Pat::Rest(rest) => pat_idents(&rest.arg),
    _ => vec![],
  }
}

fn first_top_level_binding(body: &[ModuleItem]) -> Option<JsWord> {
  for item in body {
    if let ModuleItem::Stmt(Stmt::Decl(decl)) = item {
      match decl {
        Decl::Fn(f) => return Some(f.ident.sym.clone()),
        Decl::Class(c) => return Some(c.ident.sym.clone()),
        Decl::Var(v) => {
          for declarator in &v.decls {
            if let (Pat::Ident(ident), Some(_)) = (&declarator.name, &declarator.init) {
              return Some(ident.id.sym.clone());
            }
          }
        }
        _ => {}
      }
    }
  }
  None
}
