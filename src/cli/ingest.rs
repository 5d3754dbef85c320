use anyhow::{bail, Result};

use screenmem::capture::extractors::SyntheticExtractor;
use screenmem::capture::{CaptureMetadata, CaptureOutcome, IngestPipeline};
use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::records::{CaptureTrigger, TextSource};

/// Fields for a manually supplied capture.
pub struct IngestArgs {
    pub text: String,
    pub app: String,
    pub window: Option<String>,
    pub bundle_id: Option<String>,
    pub source: TextSource,
    pub trigger: CaptureTrigger,
    pub display_id: Option<String>,
}

/// Store one record from the command line. It goes through the ingest pipeline
/// like any other capture, so empty text is rejected.
pub fn ingest(paths: &DataPaths, config: &ScreenMemConfig, args: IngestArgs) -> Result<()> {
    let store = super::open_store(paths)?;
    let app = args.app.clone();
    let metadata = CaptureMetadata {
        app_name: args.app,
        window_title: args.window,
        bundle_id: args.bundle_id,
        display_id: args.display_id,
    };
    let extractor = SyntheticExtractor::with_source(args.text, args.source, metadata);
    let mut pipeline = IngestPipeline::new(
        store,
        Box::new(extractor),
        config.capture.duplicate_window_seconds,
    );

    match pipeline.capture(args.trigger)? {
        CaptureOutcome::Stored(record) => {
            println!("Stored capture {} for {app}", record.id.unwrap_or_default());
            Ok(())
        }
        CaptureOutcome::SkippedDuplicate => {
            println!("Skipped duplicate capture");
            Ok(())
        }
        CaptureOutcome::SkippedNoText => bail!("--text is empty after trimming"),
    }
}
