use std::sync::Once;

use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the fmt subscriber, filtered by `RUST_LOG`. Safe to call from
/// multiple entry points; later calls are no-ops.
pub fn init() {
  INIT.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env())
      .try_init();
    tracing::debug!("subscriber installed");
  });
}

/// When `WEBLOOM_CHROME_TRACE` is set, write a chrome://tracing profile
/// instead of plain logs. The guard flushes the trace file on drop.
pub fn enable_tracing_on_demand() -> Option<FlushGuard> {
  if std::env::var("WEBLOOM_CHROME_TRACE").is_err() {
    init();
    return None;
  }
  let (layer, guard) = ChromeLayerBuilder::new().build();
  tracing_subscriber::registry().with(layer).init();
  Some(guard)
}
