use std::sync::Arc;

use anyhow::anyhow;
use webloom_core::{BuildError, BuildOptions, ModuleId, Pipeline};
use webloom_fs::{FileStat, FileSystem, SharedFileSystem};
use webloom_test_utils::{fixture, pipeline};

fn id(path: &str) -> ModuleId {
  ModuleId::internal(path)
}

#[tokio::test]
async fn linear_graph_bundles_in_discovery_order() {
  let mut pipeline = pipeline(&[
    (
      "/a.tsx",
      "import { b } from './b';\nexport default function App() { return <p>{b}</p>; }",
    ),
    ("/b.ts", "import { c } from './c';\nexport const b = c;"),
    ("/c.ts", "export const c = 1;"),
  ])
  .await;

  let output = pipeline.build(&BuildOptions::new("/a.tsx")).await.unwrap();

  assert_eq!(output.modules, vec![id("/a.tsx"), id("/b.ts"), id("/c.ts")]);
  assert_eq!(
    output.dependency_graph[&id("/a.tsx")],
    [id("/b.ts")].into_iter().collect()
  );
  assert_eq!(
    output.dependency_graph[&id("/b.ts")],
    [id("/c.ts")].into_iter().collect()
  );
  assert!(output.dependency_graph[&id("/c.ts")].is_empty());

  // every definition precedes the bootstrap that requires the entry
  let bootstrap = output.bundle.find("global.__bootstrap").unwrap();
  for module in &output.modules {
    let define = output
      .bundle
      .find(&format!("define({:?}", module.id()))
      .unwrap();
    assert!(define < bootstrap, "{module} must be defined before the bootstrap");
  }
}

#[tokio::test]
async fn external_imports_resolve_through_the_registry_alone() {
  let mut pipeline = pipeline(&[(
    "/app.tsx",
    "import R from 'react';\nexport default function App() { return R.createElement('div'); }",
  )])
  .await;

  let output = pipeline.build(&BuildOptions::new("/app.tsx")).await.unwrap();

  assert_eq!(output.modules, vec![id("/app.tsx")]);
  assert!(!output.bundle.contains("define(\"react\""));
  assert!(output.bundle.contains("const __react = require(\"react\");"));
  // the setup stub still knows how to load it
  assert!(output.bundle.contains("https://esm.sh/react@"));
}

#[tokio::test]
async fn css_imports_become_style_injecting_modules() {
  let mut pipeline = pipeline(&[
    ("/main.tsx", "import './g.css';\nexport default function Main() { return null; }"),
    ("/g.css", "body{color:red}"),
  ])
  .await;

  let output = pipeline.build(&BuildOptions::new("/main.tsx")).await.unwrap();

  assert_eq!(output.modules, vec![id("/main.tsx"), id("/g.css")]);
  assert_eq!(
    output.dependency_graph[&id("/main.tsx")],
    [id("/g.css")].into_iter().collect()
  );
  assert!(output.bundle.contains("define(\"/g.css\", [],"));
  assert!(output.bundle.contains("body{color:red}"));
  assert!(output.bundle.contains("style[data-module="));
}

#[tokio::test]
async fn cyclic_graphs_still_bundle() {
  let mut pipeline = pipeline(&[
    ("/a.tsx", "import './b';\nexport default function A() { return null; }"),
    ("/b.tsx", "import './a';\nexport default function B() { return null; }"),
  ])
  .await;

  let output = pipeline.build(&BuildOptions::new("/a.tsx")).await.unwrap();

  assert_eq!(output.modules, vec![id("/a.tsx"), id("/b.tsx")]);
  // the emitted registry is what reports the cycle, at require time
  assert!(output.bundle.contains("CircularDependency"));
}

#[tokio::test]
async fn self_import_bundles_once() {
  let mut pipeline = pipeline(&[(
    "/loop.ts",
    "import './loop';\nexport const x = 1;",
  )])
  .await;

  let output = pipeline.build(&BuildOptions::new("/loop.ts")).await.unwrap();
  assert_eq!(output.modules, vec![id("/loop.ts")]);
  assert!(output
    .bundle
    .contains("define(\"/loop.ts\", [\"/loop.ts\"],"));
}

/// Filesystem whose reads fail for chosen paths while probing still works,
/// reproducing a module that resolves but cannot be loaded.
#[derive(Debug)]
struct FailingReads {
  inner: SharedFileSystem,
  broken: Vec<String>,
}

#[async_trait::async_trait]
impl FileSystem for FailingReads {
  async fn read_file(&self, path: &str) -> webloom_core::BuildResult<String> {
    if self.broken.iter().any(|b| b == path) {
      return Err(BuildError::filesystem(path, anyhow!("storage read failed")));
    }
    self.inner.read_file(path).await
  }

  async fn write_file(&self, path: &str, contents: &str) -> webloom_core::BuildResult<()> {
    self.inner.write_file(path, contents).await
  }

  async fn exists(&self, path: &str) -> webloom_core::BuildResult<bool> {
    self.inner.exists(path).await
  }

  async fn mkdir(&self, path: &str) -> webloom_core::BuildResult<()> {
    self.inner.mkdir(path).await
  }

  async fn read_dir(&self, path: &str) -> webloom_core::BuildResult<Vec<String>> {
    self.inner.read_dir(path).await
  }

  async fn stat(&self, path: &str) -> webloom_core::BuildResult<FileStat> {
    self.inner.stat(path).await
  }

  async fn unlink(&self, path: &str) -> webloom_core::BuildResult<()> {
    self.inner.unlink(path).await
  }
}

#[tokio::test]
async fn failing_modules_become_synthetic_error_modules() {
  let inner = fixture(&[
    ("/main.tsx", "import './broken';\nexport default function Main() { return null; }"),
    ("/broken.tsx", "export default function Broken() { return null; }"),
  ])
  .await;
  let fs = Arc::new(FailingReads {
    inner,
    broken: vec!["/broken.tsx".to_string()],
  });

  let mut pipeline = Pipeline::new(fs);
  let output = pipeline.build(&BuildOptions::new("/main.tsx")).await.unwrap();

  assert_eq!(output.modules, vec![id("/main.tsx"), id("/broken.tsx")]);
  assert!(output.bundle.contains("module failed to build"));
  assert!(output.bundle.contains("default: () => null"));
}

#[tokio::test]
async fn a_failing_entry_fails_the_build() {
  let inner = fixture(&[("/main.tsx", "export default 1;")]).await;
  let fs = Arc::new(FailingReads {
    inner,
    broken: vec!["/main.tsx".to_string()],
  });

  let mut pipeline = Pipeline::new(fs);
  let err = pipeline
    .build(&BuildOptions::new("/main.tsx"))
    .await
    .unwrap_err();
  assert_eq!(err.code(), "FILESYSTEM_ERROR");
}

#[tokio::test]
async fn missing_entry_is_unresolved() {
  let mut pipeline = pipeline(&[]).await;
  let err = pipeline
    .build(&BuildOptions::new("/nowhere.tsx"))
    .await
    .unwrap_err();
  assert_eq!(err.code(), "UNRESOLVED_ENTRY");
}

#[tokio::test]
async fn unresolved_imports_defer_to_runtime() {
  let mut pipeline = pipeline(&[(
    "/main.tsx",
    "import gone from './gone';\nexport default function Main() { return gone; }",
  )])
  .await;

  let output = pipeline.build(&BuildOptions::new("/main.tsx")).await.unwrap();

  // the module still compiled, with no edge for the missing import
  assert_eq!(output.modules, vec![id("/main.tsx")]);
  assert!(output.bundle.contains("require(\"/gone\")"));
  let warnings = pipeline.take_warnings();
  assert!(warnings.iter().any(|w| w.code() == "UNRESOLVED_SPECIFIER"));
}

#[tokio::test]
async fn caller_externals_register_once() {
  let files = [(
    "/app.tsx",
    "import _ from 'lodash';\nexport default function App() { return _; }",
  )];
  let mut pipeline = pipeline(&files).await;
  let options = BuildOptions {
    externals: vec!["lodash".to_string()],
    ..BuildOptions::new("/app.tsx")
  };

  pipeline.build(&options).await.unwrap();
  assert_eq!(pipeline.stats().externals, 3);
  assert!(pipeline.externals().is_registered("lodash"));

  // building again keeps the registry stable
  let options_again = BuildOptions {
    externals: vec!["lodash".to_string(), "react".to_string()],
    ..BuildOptions::new("/app.tsx")
  };
  pipeline.build(&options_again).await.unwrap();
  assert_eq!(pipeline.stats().externals, 3);
  // the default react record was not clobbered by the re-registration
  assert!(pipeline.externals().get("react").unwrap().url.is_some());
}

#[tokio::test]
async fn entry_specifier_probes_extensions() {
  let mut pipeline = pipeline(&[("/src/index.tsx", "export default function App() { return null; }")]).await;
  let output = pipeline
    .build(&BuildOptions::new("/src/index"))
    .await
    .unwrap();
  assert_eq!(output.modules, vec![id("/src/index.tsx")]);

  // a directory entry falls through to its index file
  let output = pipeline.build(&BuildOptions::new("/src")).await.unwrap();
  assert_eq!(output.modules, vec![id("/src/index.tsx")]);
}
