//! The background capture loop.
//!
//! One task multiplexes the idle timer, the app-switch poll, the frame timer and
//! the retention purge. Every capture or purge runs on the blocking pool and any
//! failure is logged; the loop only stops when `shutdown` resolves.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::window::MetadataProvider;
use super::{CaptureOutcome, IngestPipeline};
use crate::config::ScreenMemConfig;
use crate::frames::FrameRetentionStore;
use crate::records::types::cutoff_before;
use crate::records::{CaptureTrigger, RecordStore};

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Timer periods and retention limits for one daemon run.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub idle_gap: Duration,
    pub active_gap: Duration,
    pub min_capture_interval: Duration,
    /// `None` disables the frame buffer.
    pub frame_interval: Option<Duration>,
    pub purge_interval: Duration,
    pub retention: chrono::Duration,
    pub max_db_bytes: u64,
}

impl Schedule {
    pub fn from_config(config: &ScreenMemConfig) -> Self {
        Self {
            idle_gap: Duration::from_secs(config.capture.idle_gap_seconds.max(1)),
            active_gap: Duration::from_secs(config.capture.active_gap_seconds.max(1)),
            min_capture_interval: Duration::from_millis(config.capture.min_capture_interval_ms),
            frame_interval: config
                .frames
                .enabled
                .then(|| Duration::from_secs(config.frames.interval_seconds.max(1))),
            purge_interval: PURGE_INTERVAL,
            retention: chrono::Duration::days(i64::from(config.storage.retention_days)),
            max_db_bytes: config.storage.max_db_size_mb.saturating_mul(1024 * 1024),
        }
    }
}

pub struct Daemon {
    pipeline: Arc<Mutex<IngestPipeline>>,
    store: Arc<RecordStore>,
    frames: Option<Arc<FrameRetentionStore>>,
    metadata: Arc<dyn MetadataProvider>,
    schedule: Schedule,
    last_attempt: Option<Instant>,
    last_app: Option<String>,
}

impl Daemon {
    pub fn new(
        pipeline: IngestPipeline,
        store: Arc<RecordStore>,
        frames: Option<Arc<FrameRetentionStore>>,
        metadata: Arc<dyn MetadataProvider>,
        schedule: Schedule,
    ) -> Self {
        let frames = frames.filter(|_| schedule.frame_interval.is_some());
        Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            store,
            frames,
            metadata,
            schedule,
            last_attempt: None,
            last_app: None,
        }
    }

    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        tracing::info!(
            idle_secs = self.schedule.idle_gap.as_secs(),
            frames = self.frames.is_some(),
            "daemon started"
        );

        let mut idle = ticker(self.schedule.idle_gap);
        let mut app_poll = ticker(self.schedule.active_gap);
        let mut frame_tick = ticker(self.schedule.frame_interval.unwrap_or(PURGE_INTERVAL));
        let mut purge_tick = ticker(self.schedule.purge_interval);

        self.capture(CaptureTrigger::Manual).await;
        self.capture_frame().await;
        self.purge().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = idle.tick() => self.capture(CaptureTrigger::Idle).await,
                _ = app_poll.tick() => self.poll_app_switch().await,
                _ = frame_tick.tick(), if self.frames.is_some() => self.capture_frame().await,
                _ = purge_tick.tick() => self.purge().await,
            }
        }

        tracing::info!("daemon stopped");
    }

    async fn capture(&mut self, trigger: CaptureTrigger) {
        let now = Instant::now();
        if let Some(last) = self.last_attempt {
            if now.duration_since(last) < self.schedule.min_capture_interval {
                tracing::debug!(%trigger, "capture skipped: too soon after the last one");
                return;
            }
        }
        self.last_attempt = Some(now);

        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || {
            let mut pipeline = pipeline.lock().unwrap_or_else(|p| p.into_inner());
            pipeline.capture(trigger)
        })
        .await;

        match result {
            Ok(Ok(CaptureOutcome::Stored(record))) => {
                tracing::debug!(%trigger, app = %record.app_name, source = %record.source, "stored capture");
            }
            Ok(Ok(CaptureOutcome::SkippedDuplicate)) => tracing::debug!(%trigger, "skipped duplicate capture"),
            Ok(Ok(CaptureOutcome::SkippedNoText)) => tracing::debug!(%trigger, "skipped capture with no text"),
            Ok(Err(e)) => tracing::error!(%trigger, error = %e, "capture failed"),
            Err(e) => tracing::error!(%trigger, error = %e, "capture task panicked"),
        }
    }

    async fn poll_app_switch(&mut self) {
        let metadata = Arc::clone(&self.metadata);
        let app = match tokio::task::spawn_blocking(move || metadata.current().app_name).await {
            Ok(app) => app,
            Err(e) => {
                tracing::error!(error = %e, "window lookup panicked");
                return;
            }
        };

        let switched = self.last_app.as_ref().is_some_and(|last| last != &app);
        self.last_app = Some(app);
        if switched {
            self.capture(CaptureTrigger::AppSwitch).await;
        }
    }

    async fn capture_frame(&self) {
        let Some(frames) = self.frames.clone() else {
            return;
        };
        match tokio::task::spawn_blocking(move || frames.capture_frame()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "frame capture failed"),
            Err(e) => tracing::error!(error = %e, "frame task panicked"),
        }
    }

    async fn purge(&self) {
        let store = Arc::clone(&self.store);
        let cutoff = cutoff_before(chrono::Utc::now(), self.schedule.retention);
        let max_bytes = self.schedule.max_db_bytes;

        let result = tokio::task::spawn_blocking(move || {
            let deleted = store.purge(cutoff)?;
            let status = store.status()?;
            Ok::<_, crate::records::StoreError>((deleted, status.database_bytes))
        })
        .await;

        match result {
            Ok(Ok((deleted, bytes))) => {
                if deleted > 0 {
                    tracing::info!(deleted, "retention purge");
                }
                if bytes > max_bytes {
                    tracing::warn!(bytes, max_bytes, "database is larger than max_db_size_mb");
                }
            }
            Ok(Err(e)) => tracing::error!(error = %e, "retention purge failed"),
            Err(e) => tracing::error!(error = %e, "purge task panicked"),
        }
    }
}

/// An interval whose first tick is one full period away.
fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureMetadata, ExtractedText, Extractor};
    use crate::records::TextSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl Extractor for Counting {
        fn extract(&self) -> anyhow::Result<Option<ExtractedText>> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ExtractedText {
                text: format!("screen state {n}"),
                source: TextSource::Synthetic,
                metadata: CaptureMetadata::unknown(),
            }))
        }
    }

    struct AlternatingApp(AtomicUsize);

    impl MetadataProvider for AlternatingApp {
        fn current(&self) -> CaptureMetadata {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            let mut meta = CaptureMetadata::unknown();
            meta.app_name = if n % 2 == 0 { "Terminal" } else { "Browser" }.to_string();
            meta
        }
    }

    fn schedule(idle_ms: u64, active_ms: u64, min_ms: u64) -> Schedule {
        Schedule {
            idle_gap: Duration::from_millis(idle_ms),
            active_gap: Duration::from_millis(active_ms),
            min_capture_interval: Duration::from_millis(min_ms),
            frame_interval: None,
            purge_interval: Duration::from_secs(3600),
            retention: chrono::Duration::days(14),
            max_db_bytes: u64::MAX,
        }
    }

    fn daemon(calls: Arc<AtomicUsize>, schedule: Schedule) -> (Daemon, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let pipeline = IngestPipeline::new(Arc::clone(&store), Box::new(Counting(calls)), 2);
        let daemon = Daemon::new(
            pipeline,
            Arc::clone(&store),
            None,
            Arc::new(AlternatingApp(AtomicUsize::new(0))),
            schedule,
        );
        (daemon, store)
    }

    #[tokio::test]
    async fn captures_on_start_and_on_idle_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (daemon, store) = daemon(Arc::clone(&calls), schedule(50, 3_600_000, 0));

        daemon.run(tokio::time::sleep(Duration::from_millis(300))).await;

        assert!(calls.load(Ordering::SeqCst) >= 3, "calls = {}", calls.load(Ordering::SeqCst));
        assert!(store.status().unwrap().record_count >= 3);
    }

    #[tokio::test]
    async fn app_switch_triggers_capture() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (daemon, store) = daemon(Arc::clone(&calls), schedule(3_600_000, 40, 0));

        daemon.run(tokio::time::sleep(Duration::from_millis(300))).await;

        // The startup capture plus at least one switch between the alternating apps.
        assert!(store.status().unwrap().record_count >= 2);
    }

    #[tokio::test]
    async fn attempts_inside_min_interval_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (daemon, _store) = daemon(Arc::clone(&calls), schedule(20, 3_600_000, 60_000));

        daemon.run(tokio::time::sleep(Duration::from_millis(200))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schedule_follows_config() {
        let mut config = ScreenMemConfig::default();
        config.frames.enabled = false;
        let s = Schedule::from_config(&config);
        assert_eq!(s.idle_gap, Duration::from_secs(30));
        assert_eq!(s.active_gap, Duration::from_secs(10));
        assert_eq!(s.frame_interval, None);
        assert_eq!(s.max_db_bytes, 200 * 1024 * 1024);
    }

    #[tokio::test]
    async fn extreme_limits_from_a_config_file_do_not_stop_the_loop() {
        let mut config = ScreenMemConfig::default();
        config.storage.retention_days = u32::MAX;
        config.storage.max_db_size_mb = u64::MAX;
        let mut s = Schedule::from_config(&config);
        assert_eq!(s.max_db_bytes, u64::MAX);
        s.idle_gap = Duration::from_millis(30);
        s.min_capture_interval = Duration::ZERO;
        s.frame_interval = None;

        let calls = Arc::new(AtomicUsize::new(0));
        let (daemon, store) = daemon(Arc::clone(&calls), s);
        daemon.run(tokio::time::sleep(Duration::from_millis(150))).await;

        assert!(store.status().unwrap().record_count >= 2);
    }
}
