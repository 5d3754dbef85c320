use anyhow::Result;
use std::sync::Arc;

use screenmem::capture::daemon::{Daemon, Schedule};
use screenmem::capture::extractors::NativeExtractor;
use screenmem::capture::window::X11Metadata;
use screenmem::capture::{CaptureOutcome, IngestPipeline};
use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::records::{CaptureTrigger, RecordStore};

fn native_pipeline(store: Arc<RecordStore>, config: &ScreenMemConfig) -> IngestPipeline {
    IngestPipeline::new(
        store,
        Box::new(NativeExtractor::from_config(&config.capture)),
        config.capture.duplicate_window_seconds,
    )
}

/// One manual capture through the desktop extractor.
pub fn capture_once(paths: &DataPaths, config: &ScreenMemConfig) -> Result<()> {
    let store = super::open_store(paths)?;
    let mut pipeline = native_pipeline(store, config);

    match pipeline.capture(CaptureTrigger::Manual)? {
        CaptureOutcome::Stored(record) => {
            println!("Stored capture for {} ({})", record.app_name, record.source)
        }
        CaptureOutcome::SkippedDuplicate => println!("Skipped duplicate capture"),
        CaptureOutcome::SkippedNoText => println!("No text captured"),
    }
    Ok(())
}

/// Run the capture loop until Ctrl-C.
pub async fn daemon(paths: &DataPaths, config: &ScreenMemConfig) -> Result<()> {
    let store = super::open_store(paths)?;
    let pipeline = native_pipeline(Arc::clone(&store), config);
    let frames = config
        .frames
        .enabled
        .then(|| Arc::new(super::frame_store(paths, config)));

    let daemon = Daemon::new(
        pipeline,
        store,
        frames,
        Arc::new(X11Metadata),
        Schedule::from_config(config),
    );

    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}
