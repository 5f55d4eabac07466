//! Storage-pressure-driven image garbage collector.
//!
//! One background task, one cycle at a time: sleep, check pressure, then
//! feed idle images to the deletion engine oldest-last-used first. Per-image
//! failures are logged and never end the loop.

use std::sync::Arc;

use chrono::Utc;
use wharf_core::config::GcConfig;
use wharf_core::container::short_id;
use wharf_core::event::{events, AuditEvent, EventEmitter};

use super::delete::ImageDeleter;
use super::graph::ImageGraph;

/// Background image garbage collector.
pub struct ImageGc {
    graph: Arc<dyn ImageGraph>,
    deleter: Arc<ImageDeleter>,
    events: EventEmitter,
    config: GcConfig,
}

impl ImageGc {
    pub fn new(
        graph: Arc<dyn ImageGraph>,
        deleter: Arc<ImageDeleter>,
        events: EventEmitter,
        config: GcConfig,
    ) -> Self {
        Self {
            graph,
            deleter,
            events,
            config,
        }
    }

    /// Run the collection loop forever.
    pub async fn run(self) {
        tracing::info!(
            interval = ?self.config.clean_interval,
            retain_percent = self.config.retain_percent,
            usage_capability = self.graph.usage_reporter().is_some(),
            "image clean loop started"
        );
        loop {
            tokio::time::sleep(self.config.clean_interval).await;
            self.run_cycle();
        }
    }

    /// Start the collector on the runtime and return its task handle.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// One collection cycle.
    ///
    /// Skipped entirely while the backend reports usage below the retain
    /// threshold; backends without the capability always scan the full
    /// list. Never-used images are never considered.
    pub fn run_cycle(&self) {
        if let Some(usage) = self.graph.usage_reporter() {
            let used = usage.data_use_percent();
            if used < self.config.retain_percent {
                tracing::debug!(used, "storage below retain threshold, skipping cycle");
                return;
            }
            tracing::info!(
                used,
                retain_percent = self.config.retain_percent,
                "data space used more than retain threshold"
            );
        }

        let mut images = self.graph.images();
        images.sort_by_key(|img| img.last_use_time);

        let now = Utc::now();
        for img in images {
            let Some(last_use) = img.last_use_time else {
                continue;
            };
            let idle = humanize_duration(now.signed_duration_since(last_use));

            match self.deleter.delete_image(&img.id, true, false, false) {
                Ok(effects) => {
                    self.events
                        .emit(AuditEvent::with_reference(events::IMAGE_CLEAN, &img.id));
                    tracing::info!(
                        id = %short_id(&img.id),
                        idle = %idle,
                        effects = effects.len(),
                        "cleaned image"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        id = %short_id(&img.id),
                        idle = %idle,
                        error = %e,
                        "failed to clean image"
                    );
                }
            }

            if let Some(usage) = self.graph.usage_reporter() {
                if usage.data_use_percent() < self.config.retain_percent {
                    break;
                }
            }
        }
    }
}

/// Render an idle duration the way the clean log reports it.
fn humanize_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds();
    if secs < 60 {
        return format!("{secs} seconds");
    }
    let mins = duration.num_minutes();
    if mins < 60 {
        return format!("{mins} minutes");
    }
    let hours = duration.num_hours();
    if hours < 48 {
        return format!("{hours} hours");
    }
    format!("{} days", duration.num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{ContainerProvider, ContainerSummary};
    use crate::images::graph::{DiskImageGraph, UsageReporter};
    use crate::images::image::Image;
    use crate::images::tags::{DiskTagStore, TagStore};
    use chrono::Duration as ChronoDuration;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    struct NoContainers;

    impl ContainerProvider for NoContainers {
        fn containers(&self) -> Vec<ContainerSummary> {
            Vec::new()
        }
    }

    /// Usage reporter replaying a scripted sequence of readings.
    struct ScriptedUsage(Mutex<Vec<f64>>);

    impl ScriptedUsage {
        fn new(readings: Vec<f64>) -> Self {
            Self(Mutex::new(readings))
        }
    }

    impl UsageReporter for ScriptedUsage {
        fn data_use_percent(&self) -> f64 {
            let mut readings = self.0.lock();
            if readings.len() > 1 {
                readings.remove(0)
            } else {
                readings[0]
            }
        }
    }

    struct Fixture {
        _tmp: TempDir,
        graph: Arc<DiskImageGraph>,
        tags: Arc<DiskTagStore>,
    }

    impl Fixture {
        fn new(usage: Option<Arc<dyn UsageReporter>>) -> Self {
            let tmp = TempDir::new().unwrap();
            let mut graph = DiskImageGraph::open(&tmp.path().join("graph")).unwrap();
            if let Some(usage) = usage {
                graph = graph.with_usage_reporter(usage);
            }
            let graph = Arc::new(graph);
            let tags = Arc::new(DiskTagStore::open(&tmp.path().join("repositories")).unwrap());
            Self {
                _tmp: tmp,
                graph,
                tags,
            }
        }

        fn image(&self, id: &str, idle_hours: Option<i64>) {
            let now = Utc::now();
            self.graph
                .insert(Image {
                    id: id.to_string(),
                    parent: None,
                    created: now,
                    last_use_time: idle_hours.map(|h| now - ChronoDuration::hours(h)),
                    size_bytes: 0,
                })
                .unwrap();
        }

        fn gc(&self, config: GcConfig) -> ImageGc {
            let deleter = Arc::new(ImageDeleter::new(
                self.graph.clone(),
                self.tags.clone(),
                Arc::new(NoContainers),
                EventEmitter::default(),
            ));
            ImageGc::new(self.graph.clone(), deleter, EventEmitter::default(), config)
        }
    }

    fn config(retain_percent: f64) -> GcConfig {
        GcConfig {
            clean_interval: std::time::Duration::from_millis(10),
            retain_percent,
        }
    }

    #[test]
    fn test_cycle_without_usage_capability_scans_everything() {
        let fx = Fixture::new(None);
        fx.image("old", Some(48));
        fx.image("newer", Some(1));
        fx.image("never-used", None);

        fx.gc(config(80.0)).run_cycle();

        assert!(fx.graph.lookup("old").is_none());
        assert!(fx.graph.lookup("newer").is_none());
        // Never-used images are never considered
        assert!(fx.graph.lookup("never-used").is_some());
    }

    #[test]
    fn test_cycle_skipped_below_retain_threshold() {
        let usage: Arc<dyn UsageReporter> = Arc::new(ScriptedUsage::new(vec![10.0]));
        let fx = Fixture::new(Some(usage));
        fx.image("old", Some(48));

        fx.gc(config(80.0)).run_cycle();

        assert!(fx.graph.lookup("old").is_some());
    }

    #[test]
    fn test_cycle_stops_once_usage_drops() {
        // Gate reading 90 -> scan; after the first deletion usage reads 50 -> stop.
        let usage: Arc<dyn UsageReporter> = Arc::new(ScriptedUsage::new(vec![90.0, 50.0]));
        let fx = Fixture::new(Some(usage));
        fx.image("oldest", Some(72));
        fx.image("younger", Some(2));

        fx.gc(config(80.0)).run_cycle();

        // Oldest-last-used goes first; the second image survives the cycle.
        assert!(fx.graph.lookup("oldest").is_none());
        assert!(fx.graph.lookup("younger").is_some());
    }

    #[test]
    fn test_per_image_failures_do_not_stop_the_cycle() {
        let fx = Fixture::new(None);
        // In use by nothing, but tagged in two repos: unforced deletion conflicts.
        fx.image("conflicted", Some(48));
        fx.tags.set("user/app", "latest", "conflicted").unwrap();
        fx.tags.set("mirror/app", "v1", "conflicted").unwrap();
        fx.image("collectable", Some(24));

        fx.gc(config(80.0)).run_cycle();

        assert!(fx.graph.lookup("conflicted").is_some());
        assert!(fx.graph.lookup("collectable").is_none());
    }

    #[test]
    fn test_humanize_duration() {
        assert_eq!(humanize_duration(ChronoDuration::seconds(42)), "42 seconds");
        assert_eq!(humanize_duration(ChronoDuration::minutes(5)), "5 minutes");
        assert_eq!(humanize_duration(ChronoDuration::hours(30)), "30 hours");
        assert_eq!(humanize_duration(ChronoDuration::days(4)), "4 days");
    }
}
