//! Batch Integration Tests
//!
//! Drives full scan → transcode → relocate | quarantine batches against
//! temporary directories, with scripted stand-ins for mediainfo and
//! HandBrakeCLI.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reelqueue::domain::{BatchState, ItemOutcome, Tier};
use reelqueue::ingest::scan_staging;
use reelqueue::{Config, Driver, EncodeJob, Encoder, EncoderExit, Inspector, QueueCheckpoint, Toolchain};
use tempfile::TempDir;
use tokio::fs;

/// Reports the same resolution for every file
struct StaticInspector(&'static str);

#[async_trait]
impl Inspector for StaticInspector {
    fn name(&self) -> &str {
        "static"
    }

    async fn dimensions(&self, _path: &Path) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Succeeds for every file except those with "bad" in the name, which get
/// a partial output and a non-zero exit.
#[derive(Default)]
struct ScriptedEncoder {
    jobs: Mutex<Vec<(PathBuf, Tier)>>,
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn encode(&self, job: &EncodeJob) -> anyhow::Result<EncoderExit> {
        self.jobs.lock().unwrap().push((job.input.clone(), job.tier));
        let name = job.input.file_name().unwrap().to_string_lossy().into_owned();
        if name.contains("bad") {
            fs::write(&job.output, b"partial").await?;
            Ok(EncoderExit::from_code(1))
        } else {
            fs::write(&job.output, b"encoded").await?;
            Ok(EncoderExit::from_code(0))
        }
    }
}

/// Reads the checkpoint file while each item is being encoded
struct CheckpointReader {
    queue: PathBuf,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl Encoder for CheckpointReader {
    fn name(&self) -> &str {
        "checkpoint-reader"
    }

    async fn encode(&self, job: &EncodeJob) -> anyhow::Result<EncoderExit> {
        let content = fs::read_to_string(&self.queue).await.unwrap_or_default();
        self.seen.lock().unwrap().push(content);
        fs::write(&job.output, b"encoded").await?;
        Ok(EncoderExit::from_code(0))
    }
}

struct Workspace {
    temp: TempDir,
    staging: PathBuf,
    library: PathBuf,
}

impl Workspace {
    async fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        let library = temp.path().join("plex");
        fs::create_dir_all(&staging).await.unwrap();
        Self {
            temp,
            staging,
            library,
        }
    }

    fn config(&self) -> Config {
        let yaml = format!(
            r#"
paths:
  staging: {staging}
  plex: {library}
  queue_file: {queue}
presets:
  4kUHD:
    encoder: x265_10bit
    quality: 22
    preset: slow
    format: av_mkv
    audio: {{ lang_list: eng, encoder: copy, fallback: ac3 }}
  bluray:
    encoder: x265
    quality: 20
    preset: medium
    format: av_mkv
    max_width: 1920
    max_height: 1080
    audio: {{ lang_list: eng, encoder: copy, fallback: ac3 }}
  dvd:
    encoder: x264
    quality: 18
    preset: medium
    format: av_mkv
    decomb: default
    audio: {{ lang_list: eng, encoder: av_aac, fallback: av_aac }}
"#,
            staging = self.staging.display(),
            library = self.library.display(),
            queue = self.queue_path().display(),
        );
        Config::from_yaml(&yaml, self.temp.path()).unwrap()
    }

    fn queue_path(&self) -> PathBuf {
        self.temp.path().join("queue.txt")
    }

    async fn staged(&self, name: &str) -> PathBuf {
        let path = self.staging.join(name);
        fs::write(&path, b"source video").await.unwrap();
        path
    }

    async fn in_library(&self, name: &str) {
        fs::create_dir_all(&self.library).await.unwrap();
        fs::write(self.library.join(name), b"already there").await.unwrap();
    }

    fn driver(&self, encoder: Arc<dyn Encoder>) -> Driver {
        let tools = Toolchain::new(Arc::new(StaticInspector("1920x1080")), encoder);
        Driver::new(self.config(), tools)
    }
}

#[tokio::test]
async fn test_scan_queues_only_new_files() {
    let ws = Workspace::new().await;
    ws.staged("a.mkv").await;
    ws.staged("b.mkv").await;
    ws.staged("c-transcoded.mkv").await;
    ws.in_library("b.mkv").await;

    let config = ws.config();
    let queue = QueueCheckpoint::from_config(&config);
    let result = scan_staging(&config, &queue).await.unwrap();

    let staging = fs::canonicalize(&ws.staging).await.unwrap();
    assert_eq!(result.queued, vec![staging.join("a.mkv")]);

    let raw = fs::read_to_string(ws.queue_path()).await.unwrap();
    assert_eq!(raw, staging.join("a.mkv").to_string_lossy());
}

#[tokio::test]
async fn test_empty_scan_writes_no_queue() {
    let ws = Workspace::new().await;
    ws.staged("done-transcoded.mkv").await;

    let config = ws.config();
    let queue = QueueCheckpoint::from_config(&config);
    let result = scan_staging(&config, &queue).await.unwrap();

    assert!(result.is_empty());
    assert!(!ws.queue_path().exists());
}

#[tokio::test]
async fn test_batch_relocates_successes_and_quarantines_failures() {
    let ws = Workspace::new().await;
    ws.staged("good.mkv").await;
    ws.staged("bad.mkv").await;
    let encoder = Arc::new(ScriptedEncoder::default());

    let report = ws.driver(encoder.clone()).run_batch().await.unwrap();

    assert_eq!(report.state, BatchState::Drained);
    assert!(report.completed_at.is_some());
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.relocated(), 1);
    assert_eq!(report.quarantined(), 1);
    assert_eq!(report.needs_attention(), 0);

    // Success: library copy under the original name, staging cleaned up
    assert_eq!(
        fs::read(ws.library.join("good.mkv")).await.unwrap(),
        b"encoded"
    );
    assert!(!ws.staging.join("good.mkv").exists());
    assert!(!ws.staging.join("good-transcoded.mkv").exists());

    // Failure: source and partial output in quarantine
    let failed = ws.staging.join("failed");
    assert!(failed.join("bad.mkv").exists());
    assert!(failed.join("bad-transcoded.mkv").exists());
    assert!(!ws.staging.join("bad.mkv").exists());

    // Checkpoint removed at the end of the batch
    assert!(!ws.queue_path().exists());

    let jobs = encoder.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|(_, tier)| *tier == Tier::Bluray));
}

#[tokio::test]
async fn test_nothing_to_do_drains_immediately() {
    let ws = Workspace::new().await;
    ws.staged("movie.mkv").await;
    ws.in_library("movie.mkv").await;
    let encoder = Arc::new(ScriptedEncoder::default());

    let report = ws.driver(encoder.clone()).run_batch().await.unwrap();

    assert_eq!(report.state, BatchState::Drained);
    assert!(report.is_empty());
    assert!(encoder.jobs.lock().unwrap().is_empty());
    assert!(ws.staging.join("movie.mkv").exists());
}

#[tokio::test]
async fn test_missing_staging_fails_the_batch() {
    let ws = Workspace::new().await;
    fs::remove_dir_all(&ws.staging).await.unwrap();

    let result = ws.driver(Arc::new(ScriptedEncoder::default())).run_batch().await;

    assert!(result.is_err());
    assert!(!ws.queue_path().exists());
}

#[tokio::test]
async fn test_relocation_failure_does_not_stop_the_batch() {
    let ws = Workspace::new().await;
    ws.staged("first.mkv").await;
    ws.staged("second.mkv").await;
    // A file where the library directory should be makes every relocation fail
    fs::write(&ws.library, b"not a directory").await.unwrap();
    let encoder = Arc::new(ScriptedEncoder::default());

    let report = ws.driver(encoder.clone()).run_batch().await.unwrap();

    assert_eq!(report.items.len(), 2);
    assert!(report
        .items
        .iter()
        .all(|(_, outcome)| matches!(outcome, ItemOutcome::RelocationFailed { .. })));
    assert_eq!(encoder.jobs.lock().unwrap().len(), 2);

    // Nothing destroyed, checkpoint still cleared
    assert!(ws.staging.join("first.mkv").exists());
    assert!(ws.staging.join("first-transcoded.mkv").exists());
    assert!(!ws.queue_path().exists());
}

#[tokio::test]
async fn test_stale_checkpoint_is_replaced_by_scan() {
    let ws = Workspace::new().await;
    fs::write(ws.queue_path(), "/somewhere/else/old.mkv").await.unwrap();
    ws.staged("fresh.mkv").await;
    let encoder = Arc::new(ScriptedEncoder::default());

    let report = ws.driver(encoder.clone()).run_batch().await.unwrap();

    assert_eq!(report.items.len(), 1);
    assert!(report.items[0].0.ends_with("fresh.mkv"));
    assert!(ws.library.join("fresh.mkv").exists());
}

#[tokio::test]
async fn test_checkpoint_lives_exactly_as_long_as_the_batch() {
    let ws = Workspace::new().await;
    ws.staged("one.mkv").await;
    ws.staged("two.mkv").await;
    let encoder = Arc::new(CheckpointReader {
        queue: ws.queue_path(),
        seen: Mutex::new(Vec::new()),
    });

    let report = ws.driver(encoder.clone()).run_batch().await.unwrap();

    assert_eq!(report.relocated(), 2);
    let seen = encoder.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    for content in seen.iter() {
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("one.mkv"));
        assert!(content.contains("two.mkv"));
    }
    assert!(!ws.queue_path().exists());
}
