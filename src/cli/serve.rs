use anyhow::Result;
use std::sync::Arc;

use screenmem::api::server;
use screenmem::api::ApiResponder;
use screenmem::config::{DataPaths, ScreenMemConfig};

/// Serve the read-only query API until Ctrl-C.
pub async fn serve(paths: &DataPaths, config: &ScreenMemConfig) -> Result<()> {
    let store = super::open_store(paths)?;
    let responder = ApiResponder::new(store, Arc::new(super::system_probes(config)));
    server::serve(&config.server, responder).await
}
