use std::sync::Arc;

use webloom_core::{BuildOptions, Pipeline};
use webloom_fs::{FileSystem, MemoryFileSystem};

#[tokio::main(flavor = "current_thread")]
async fn main() {
  webloom_tracing::init();

  let fs = MemoryFileSystem::new();
  fs.write_file(
    "/app.tsx",
    "import { Counter } from './counter';\n\
     import './app.css';\n\
     export default function App() {\n\
       return <main><h1>Demo</h1><Counter start={3} /></main>;\n\
     }\n",
  )
  .await
  .unwrap();
  fs.write_file(
    "/counter.tsx",
    "import { useState } from 'react';\n\
     export function Counter({ start }: { start: number }) {\n\
       const [value, setValue] = useState(start);\n\
       return <button onClick={() => setValue(value + 1)}>{value}</button>;\n\
     }\n",
  )
  .await
  .unwrap();
  fs.write_file("/app.css", "main { font-family: sans-serif; }")
    .await
    .unwrap();

  let mut pipeline = Pipeline::new(Arc::new(fs));
  let output = pipeline
    .build(&BuildOptions::new("/app.tsx"))
    .await
    .expect("demo app should build");

  eprintln!("modules: {:?}", output.modules);
  println!("{}", output.bundle);
}
