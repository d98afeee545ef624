//! Three-pass pipeline orchestrator.
//!
//! Pass one discovers candidates from local roots and remote drives, pass
//! two enriches each candidate (metadata, text, classification, effort,
//! tags), pass three writes the report. Passes can run independently on
//! seeded output from a prior run, or together via [`Pipeline::run_all`].
//! Documents are processed strictly sequentially within pass two; one bad
//! document is recorded and skipped, never aborting the batch.

pub mod progress;

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::classifier::RuleSet;
use crate::config::{Config, EffortConfig, Settings};
use crate::discovery::{enumerate_drive, LocalScanner, YearFilter};
use crate::drive::{DriveClient, DriveError, HttpDriveClient, RemoteFile};
use crate::extract::ExtractorRegistry;
use crate::metadata::{
    FinderTagStore, MetadataReader, NullMetadataReader, NullTagStore, SpotlightReader, TagStore,
};
use crate::models::{Artifact, CandidateDocument, Origin};
use crate::report;

pub use progress::{ProgressEvent, ProgressSink, Stage};

/// Pass-two sub-step labels, in execution order.
mod step {
    pub const LOADING: &str = "Loading file";
    pub const LOADED: &str = "File loaded";
    pub const READING_METADATA: &str = "Reading metadata";
    pub const METADATA_DONE: &str = "Metadata extracted";
    pub const EXTRACTING: &str = "Extracting text content";
    pub const EXTRACTED: &str = "Text extracted";
    pub const CLASSIFYING: &str = "Classifying document";
    pub const CLASSIFIED: &str = "Classification complete";
    pub const ESTIMATING_EFFORT: &str = "Estimating effort";
    pub const EFFORT_DONE: &str = "Effort estimated";
    pub const TAGGING: &str = "Applying Finder tags";
    pub const COMPLETE: &str = "Complete";
    pub const ERROR: &str = "Error";
}

/// Orchestrator lifecycle. Running states move forward only; any running
/// state can drop to `Failed` on an unrecoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    PassOneRunning,
    PassOneComplete,
    PassTwoRunning,
    PassTwoComplete,
    PassThreeRunning,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Usage error: a later pass invoked without the prior pass's output.
    #[error("{0} requires output from the previous pass; run it first or seed its input")]
    MissingPassOutput(&'static str),

    #[error("all configured sources failed; nothing to process")]
    AllSourcesUnavailable,

    #[error(transparent)]
    Report(#[from] report::ReportError),
}

/// Composite result of [`Pipeline::run_all`].
#[derive(Debug, Clone)]
pub struct RunAllResult {
    pub candidate_count: usize,
    pub processed_count: usize,
    pub report_path: PathBuf,
}

/// Sequences the three passes over one configuration.
pub struct Pipeline {
    config: Config,
    settings: Settings,
    rule_set: RuleSet,
    registry: ExtractorRegistry,
    metadata_reader: Box<dyn MetadataReader>,
    tag_store: Box<dyn TagStore>,
    drive_clients: HashMap<String, Box<dyn DriveClient>>,
    year_filter: YearFilter,
    sink: ProgressSink,
    cancel: Arc<AtomicBool>,

    state: PipelineState,
    candidates: Vec<CandidateDocument>,
    artifacts: Vec<Artifact>,
}

impl Pipeline {
    /// Build a pipeline with platform-default components. Tagging falls
    /// back to a no-op store when disabled in config.
    pub fn new(config: Config, settings: Settings, sink: ProgressSink) -> Self {
        let rule_set = RuleSet::from_config(&config.rules, &config.scoring);
        let tag_store: Box<dyn TagStore> = if config.tagging.enabled {
            Box::new(FinderTagStore)
        } else {
            Box::new(NullTagStore)
        };
        Self {
            rule_set,
            registry: ExtractorRegistry::default(),
            metadata_reader: Box::new(SpotlightReader),
            tag_store,
            drive_clients: HashMap::new(),
            year_filter: YearFilter::default(),
            sink,
            cancel: Arc::new(AtomicBool::new(false)),
            state: PipelineState::Idle,
            candidates: Vec::new(),
            artifacts: Vec::new(),
            config,
            settings,
        }
    }

    pub fn with_metadata_reader(mut self, reader: Box<dyn MetadataReader>) -> Self {
        self.metadata_reader = reader;
        self
    }

    pub fn with_tag_store(mut self, store: Box<dyn TagStore>) -> Self {
        self.tag_store = store;
        self
    }

    /// Inject a drive client, bypassing credential-file construction.
    pub fn with_drive_client(mut self, name: &str, client: Box<dyn DriveClient>) -> Self {
        self.drive_clients.insert(name.to_string(), client);
        self
    }

    pub fn with_year_filter(mut self, filter: YearFilter) -> Self {
        self.year_filter = filter;
        self
    }

    /// Disable metadata reads, for platforms or tests without Spotlight.
    pub fn without_metadata(self) -> Self {
        self.with_metadata_reader(Box::new(NullMetadataReader))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Handle for requesting a stop between documents. The current
    /// document always finishes.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Seed pass-one output, enabling a stage-scoped pass-two run.
    pub fn seed_candidates(&mut self, candidates: Vec<CandidateDocument>) {
        self.candidates = candidates;
        self.state = PipelineState::PassOneComplete;
    }

    /// Seed pass-two output, enabling a stage-scoped pass-three run.
    pub fn seed_artifacts(&mut self, artifacts: Vec<Artifact>) {
        self.artifacts = artifacts;
        self.state = PipelineState::PassTwoComplete;
    }

    /// Pass one: enumerate local roots and enabled drives, then apply the
    /// year filter. A failing source is skipped with a warning; only the
    /// failure of every configured source is fatal.
    pub async fn pass_one(&mut self) -> Result<&[CandidateDocument], PipelineError> {
        self.state = PipelineState::PassOneRunning;
        let mut candidates = Vec::new();
        let mut sources_total = 0usize;
        let mut sources_failed = 0usize;

        if !self.settings.search_roots.is_empty() {
            sources_total += 1;
            let mut event = ProgressEvent::new(Stage::PassOne, "Scanning local folders");
            self.sink.emit(event.clone());

            let scanner = LocalScanner::new(
                self.settings.search_roots.clone(),
                self.config.ignored_directories.clone(),
                self.config.allowed_extensions(),
            );
            let found = scanner.scan();
            event.message = format!("Found {} local file(s)", found.len());
            event.scanned_count = found.len();
            self.sink.emit(event);
            candidates.extend(found);
        }

        let drives: Vec<_> = self.config.enabled_drives().cloned().collect();
        for source in drives {
            sources_total += 1;
            self.sink.emit(ProgressEvent::new(
                Stage::PassOne,
                format!("Listing drive '{}'", source.name),
            ));
            match self.drive_candidates(&source).await {
                Ok(found) => {
                    let mut event = ProgressEvent::new(
                        Stage::PassOne,
                        format!("Drive '{}': {} candidate(s)", source.name, found.len()),
                    );
                    event.scanned_count = found.len();
                    self.sink.emit(event);
                    candidates.extend(found);
                }
                Err(err) => {
                    sources_failed += 1;
                    tracing::warn!("drive '{}' skipped: {}", source.name, err);
                    let mut event = ProgressEvent::new(
                        Stage::PassOne,
                        format!("Drive '{}' skipped", source.name),
                    );
                    event.error = Some(err);
                    self.sink.emit(event);
                }
            }
        }

        if sources_total > 0 && sources_failed == sources_total {
            self.state = PipelineState::Failed;
            return Err(PipelineError::AllSourcesUnavailable);
        }

        if !self.year_filter.is_empty() {
            let before = candidates.len();
            candidates = self
                .year_filter
                .apply(candidates, self.metadata_reader.as_ref());
            tracing::info!(
                "year filter {} kept {} of {} candidate(s)",
                self.year_filter.label(),
                candidates.len(),
                before
            );
        }

        let mut event = ProgressEvent::new(
            Stage::PassOne,
            format!("Discovery complete: {} candidate(s)", candidates.len()),
        );
        event.scanned_count = candidates.len();
        event.total_candidates = Some(candidates.len());
        self.sink.emit(event);

        self.candidates = candidates;
        self.state = PipelineState::PassOneComplete;
        Ok(&self.candidates)
    }

    async fn drive_candidates(
        &mut self,
        source: &crate::drive::DriveSourceConfig,
    ) -> Result<Vec<CandidateDocument>, String> {
        let client = self.client_for(&source.name, source)?;
        match client.authenticate().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(DriveError::NotAuthenticated(source.name.clone()).to_string())
            }
            Err(err) => return Err(err.to_string()),
        }
        enumerate_drive(client, source).await.map_err(|e| e.to_string())
    }

    /// Make sure a client exists for the candidate's drive. Pass two can run
    /// on seeded candidates without a prior discovery in this process, so
    /// missing clients are built from the configured credentials here.
    fn ensure_drive_client(&mut self, candidate: &CandidateDocument) -> Result<(), String> {
        let drive = match &candidate.origin {
            Origin::Remote { drive, .. } => drive.clone(),
            Origin::Local { .. } => return Ok(()),
        };
        if self.drive_clients.contains_key(&drive) {
            return Ok(());
        }
        let source = self
            .config
            .drives
            .iter()
            .find(|s| s.name == drive)
            .cloned()
            .ok_or_else(|| format!("no configured drive named '{drive}'"))?;
        self.client_for(&source.name, &source).map(|_| ())
    }

    /// Cached or newly built client for a named drive.
    fn client_for(
        &mut self,
        name: &str,
        source: &crate::drive::DriveSourceConfig,
    ) -> Result<&dyn DriveClient, String> {
        if !self.drive_clients.contains_key(name) {
            let credentials = source
                .credentials_file
                .as_ref()
                .ok_or_else(|| format!("drive '{}' has no credentials_file", name))?;
            let expanded = shellexpand::full(credentials)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| credentials.clone());
            let client =
                HttpDriveClient::from_credentials_file(name, std::path::Path::new(&expanded))
                    .map_err(|e| e.to_string())?;
            self.drive_clients.insert(name.to_string(), Box::new(client));
        }
        Ok(self.drive_clients[name].as_ref())
    }

    /// Pass two: enrich every candidate into an [`Artifact`]. Sequential by
    /// design; per-document failures are recorded and the batch continues.
    pub async fn pass_two(&mut self) -> Result<&[Artifact], PipelineError> {
        if self.state != PipelineState::PassOneComplete {
            return Err(PipelineError::MissingPassOutput("pass two"));
        }
        self.state = PipelineState::PassTwoRunning;

        let candidates = std::mem::take(&mut self.candidates);
        let total = candidates.len();
        let started = Instant::now();
        let mut artifacts = Vec::with_capacity(total);
        let mut bucket_totals: HashMap<String, usize> = HashMap::new();
        let mut eta_seconds: Option<u64> = None;

        for (index, candidate) in candidates.into_iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!("cancellation requested, stopping before next document");
                break;
            }

            let client_ready = self.ensure_drive_client(&candidate);

            let identifier = candidate.origin.identifier();
            let display_name = candidate.display_name.clone();
            let emit_step = |step: &str, percent: u8, error: Option<String>| {
                let mut event =
                    ProgressEvent::new(Stage::PassTwo, format!("{}: {}", display_name, step));
                event.scanned_count = index;
                event.total_candidates = Some(total);
                event.current_document = Some(identifier.clone());
                event.file_progress_percent = Some(percent);
                event.file_progress_step = Some(step.to_string());
                event.bucket_totals = bucket_totals.clone();
                event.eta_seconds = eta_seconds;
                event.error = error;
                self.sink.emit(event);
            };

            let processed = match client_ready {
                Ok(()) => self.process_document(candidate, &emit_step).await,
                Err(message) => Err((candidate, message)),
            };
            let artifact = match processed {
                Ok(artifact) => artifact,
                Err((candidate, message)) => {
                    tracing::warn!("document '{}' failed: {}", identifier, message);
                    emit_step(step::ERROR, 100, Some(message));
                    let mut failed = Artifact::new(candidate);
                    failed.failed = true;
                    failed
                }
            };

            let bucket = artifact.bucket();
            *bucket_totals.entry(bucket.clone()).or_insert(0) += 1;

            let completed = index + 1;
            let remaining = total - completed;
            if remaining > 0 {
                let per_doc = started.elapsed().as_secs_f64() / completed as f64;
                eta_seconds = Some((per_doc * remaining as f64).round() as u64);
            } else {
                eta_seconds = None;
            }

            let mut event = ProgressEvent::new(
                Stage::PassTwo,
                format!("Processed {} of {}", completed, total),
            );
            event.scanned_count = completed;
            event.total_candidates = Some(total);
            event.bucket = Some(bucket);
            event.bucket_totals = bucket_totals.clone();
            event.finder_tagged = artifact.finder_tagged;
            event.eta_seconds = eta_seconds;
            self.sink.emit(event);

            artifacts.push(artifact);
        }

        self.artifacts = artifacts;
        self.state = PipelineState::PassTwoComplete;
        Ok(&self.artifacts)
    }

    /// Enrich one document through the pass-two sub-steps. Any failure
    /// returns the candidate so the caller can record a failed artifact.
    async fn process_document(
        &self,
        candidate: CandidateDocument,
        emit_step: &dyn Fn(&str, u8, Option<String>),
    ) -> Result<Artifact, (CandidateDocument, String)> {
        // Load or download: 0-30. Remote copies live in a temp file that is
        // deleted on every exit path when the guard drops.
        let mut _temp_guard: Option<tempfile::NamedTempFile> = None;
        let local_path: PathBuf = match &candidate.origin {
            Origin::Local { path } => {
                emit_step(step::LOADING, 0, None);
                let path = path.clone();
                emit_step(step::LOADED, 30, None);
                path
            }
            Origin::Remote { drive, file_id } => {
                emit_step(&format!("Downloading from {drive}"), 0, None);
                let client = self
                    .drive_clients
                    .get(drive)
                    .ok_or_else(|| {
                        (
                            candidate.clone(),
                            format!("no client for drive '{drive}'"),
                        )
                    })?
                    .as_ref();
                let remote = remote_descriptor(&candidate, file_id);
                let sink = &self.sink;
                let identifier = candidate.origin.identifier();
                let on_bytes = move |done: u64, total: u64| {
                    // Byte progress maps onto the 0-30 download window.
                    let fraction = if total > 0 { done as f64 / total as f64 } else { 0.0 };
                    let mut event = ProgressEvent::new(
                        Stage::PassTwo,
                        format!("Downloading from {drive}"),
                    );
                    event.current_document = Some(identifier.clone());
                    event.file_progress_percent = Some((fraction * 30.0) as u8);
                    event.file_progress_step = Some(format!("Downloading from {drive}"));
                    sink.emit(event);
                };
                let bytes = client
                    .download(&remote, &on_bytes)
                    .await
                    .map_err(|e| (candidate.clone(), e.to_string()))?;

                let temp = tempfile::Builder::new()
                    .suffix(&format!(".{}", remote.local_extension()))
                    .tempfile()
                    .and_then(|mut f| f.write_all(&bytes).map(|_| f))
                    .map_err(|e| (candidate.clone(), format!("temp file: {e}")))?;
                let path = temp.path().to_path_buf();
                _temp_guard = Some(temp);
                emit_step(step::LOADED, 30, None);
                path
            }
        };

        let mut artifact = Artifact::new(candidate);

        // Metadata: 30-45.
        emit_step(step::READING_METADATA, 30, None);
        artifact.metadata = self.metadata_reader.read(&local_path);
        emit_step(step::METADATA_DONE, 45, None);

        // Text extraction: 45-70. Failures inside the registry degrade to
        // empty text and are logged there.
        emit_step(step::EXTRACTING, 45, None);
        let text = self.registry.extract(&local_path);
        artifact.text = if text.is_empty() { None } else { Some(text) };
        emit_step(step::EXTRACTED, 70, None);

        // Classification: 70-85.
        emit_step(step::CLASSIFYING, 70, None);
        let classification = self.rule_set.classify(
            artifact.text.as_deref(),
            &artifact.candidate.display_name,
            &artifact.metadata,
        );
        artifact.classification = Some(classification);
        emit_step(step::CLASSIFIED, 85, None);

        // Effort: 85-90.
        emit_step(step::ESTIMATING_EFFORT, 85, None);
        artifact.hours_spent = estimate_effort(
            artifact.text.as_deref(),
            &artifact.metadata,
            &self.config.effort,
        );
        emit_step(step::EFFORT_DONE, 90, None);

        // Tags: 90-100. Local documents only; remote sources have no
        // filesystem entry to tag.
        if self.config.tagging.enabled && artifact.candidate.origin.is_local() {
            emit_step(step::TAGGING, 90, None);
            artifact.finder_tagged = Some(self.apply_tags(&artifact, &local_path));
        }
        emit_step(step::COMPLETE, 100, None);

        Ok(artifact)
    }

    /// Write the desired tags and verify by reading them back.
    fn apply_tags(&self, artifact: &Artifact, path: &std::path::Path) -> bool {
        let classification = match &artifact.classification {
            Some(c) if !c.is_unclassified() => c,
            _ => return false,
        };
        let mut desired = vec![classification.primary.clone(), classification.destination.clone()];
        if let Some(color) = self.config.tagging.colors.get(&classification.primary) {
            desired.push(color.clone());
        }
        self.tag_store.write_tags(path, &desired);
        let applied = self.tag_store.read_tags(path);
        desired.iter().all(|tag| applied.contains(tag))
    }

    /// Pass three: write the report. Requires pass-two output.
    pub fn pass_three(&mut self) -> Result<PathBuf, PipelineError> {
        if self.state != PipelineState::PassTwoComplete {
            return Err(PipelineError::MissingPassOutput("pass three"));
        }
        self.state = PipelineState::PassThreeRunning;

        let path = report::report_path(
            self.settings.report_dir.as_deref(),
            &self.year_filter.label(),
        );
        self.sink.emit(ProgressEvent::new(
            Stage::PassThree,
            format!("Writing report to {}", path.display()),
        ));
        if let Err(err) = report::write_report(&self.artifacts, &path) {
            self.state = PipelineState::Failed;
            return Err(err.into());
        }

        let mut event = ProgressEvent::new(
            Stage::PassThree,
            format!("Report written: {} row(s)", self.artifacts.len()),
        );
        event.scanned_count = self.artifacts.len();
        event.total_candidates = Some(self.artifacts.len());
        self.sink.emit(event);

        self.state = PipelineState::Done;
        Ok(path)
    }

    /// All three passes in sequence.
    pub async fn run_all(&mut self) -> Result<RunAllResult, PipelineError> {
        self.pass_one().await?;
        let candidate_count = self.candidates.len();
        self.pass_two().await?;
        let processed_count = self.artifacts.len();
        let report_path = self.pass_three()?;
        Ok(RunAllResult {
            candidate_count,
            processed_count,
            report_path,
        })
    }

    pub fn candidates(&self) -> &[CandidateDocument] {
        &self.candidates
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }
}

/// Rebuild the remote descriptor pass one saw, from the candidate fields.
fn remote_descriptor(candidate: &CandidateDocument, file_id: &str) -> RemoteFile {
    RemoteFile {
        id: file_id.to_string(),
        name: candidate.display_name.clone(),
        mime_type: candidate
            .mime_hint
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        size: candidate.size,
        modified_time: candidate
            .modified
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        web_view_link: String::new(),
        drive_name: match &candidate.origin {
            Origin::Remote { drive, .. } => drive.clone(),
            Origin::Local { .. } => String::new(),
        },
    }
}

/// Parse "<marker> <number>" out of extracted text. Only attempted when an
/// author-like metadata field is present; any parse failure yields unknown
/// rather than zero.
fn estimate_effort(
    text: Option<&str>,
    metadata: &HashMap<String, String>,
    config: &EffortConfig,
) -> Option<f64> {
    let has_author = config
        .author_keys
        .iter()
        .any(|key| metadata.get(key).map(|v| !v.is_empty()).unwrap_or(false));
    if !has_author {
        return None;
    }
    let text = text?;
    let start = text.find(&config.marker)? + config.marker.len();
    let rest = text[start..].trim_start();
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let hours: f64 = token.parse().ok()?;
    if hours.is_finite() && hours >= 0.0 {
        Some(hours)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportingConfig;
    use crate::drive::{DownloadProgress, DriveSourceConfig, FilePage};
    use crate::metadata::TaggingConfig;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    /// Always reports an invalid token, like an expired stored credential.
    struct RejectingDrive;

    #[async_trait::async_trait]
    impl DriveClient for RejectingDrive {
        async fn authenticate(&self) -> Result<bool, DriveError> {
            Ok(false)
        }

        async fn list_page(
            &self,
            _folder_id: Option<&str>,
            _page_token: Option<&str>,
        ) -> Result<FilePage, DriveError> {
            Err(DriveError::NotAuthenticated("archive".to_string()))
        }

        async fn download(
            &self,
            _file: &RemoteFile,
            _progress: DownloadProgress<'_>,
        ) -> Result<Vec<u8>, DriveError> {
            Err(DriveError::NotAuthenticated("archive".to_string()))
        }
    }

    /// Captures written tags and echoes them back on read.
    #[derive(Default)]
    struct RecordingTagStore {
        written: Arc<Mutex<Vec<String>>>,
    }

    impl TagStore for RecordingTagStore {
        fn read_tags(&self, _path: &Path) -> Vec<String> {
            self.written.lock().unwrap().clone()
        }

        fn write_tags(&self, _path: &Path, tags: &[String]) {
            *self.written.lock().unwrap() = tags.to_vec();
        }
    }

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn test_pipeline(search_root: &std::path::Path, report_dir: &std::path::Path) -> Pipeline {
        let config = Config {
            search_roots: vec![search_root.to_string_lossy().into_owned()],
            reporting: Some(ReportingConfig {
                output_dir: report_dir.to_string_lossy().into_owned(),
            }),
            ..Config::default()
        };
        let settings = Settings {
            base_dir: search_root.to_path_buf(),
            search_roots: vec![search_root.to_path_buf()],
            report_dir: Some(report_dir.to_path_buf()),
        };
        Pipeline::new(config, settings, ProgressSink::disabled())
            .without_metadata()
            .with_tag_store(Box::new(NullTagStore))
    }

    #[test]
    fn effort_requires_author_metadata() {
        let config = EffortConfig::default();
        let text = Some("Summary of work. HoursSpent: 12.5 over the term.");
        assert_eq!(estimate_effort(text, &metadata(&[]), &config), None);
        let with_author = metadata(&[("kMDItemAuthors", "R. Chen")]);
        assert_eq!(estimate_effort(text, &with_author, &config), Some(12.5));
    }

    #[test]
    fn effort_parse_failure_is_unknown_not_zero() {
        let config = EffortConfig::default();
        let with_author = metadata(&[("author", "someone")]);
        assert_eq!(
            estimate_effort(Some("HoursSpent: lots"), &with_author, &config),
            None
        );
        assert_eq!(estimate_effort(None, &with_author, &config), None);
        assert_eq!(
            estimate_effort(Some("no marker here"), &with_author, &config),
            None
        );
    }

    #[tokio::test]
    async fn pass_two_before_pass_one_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = test_pipeline(dir.path(), dir.path());
        let result = pipeline.pass_two().await;
        assert!(matches!(result, Err(PipelineError::MissingPassOutput(_))));
    }

    #[tokio::test]
    async fn full_run_produces_one_report_row_per_candidate() {
        let docs = tempfile::tempdir().unwrap();
        let reports = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("syllabus_fall.txt"), "course syllabus").unwrap();
        fs::write(docs.path().join("unrelated.txt"), "grocery list").unwrap();

        let mut pipeline = test_pipeline(docs.path(), reports.path());
        let result = pipeline.run_all().await.unwrap();
        assert_eq!(result.candidate_count, 2);
        assert_eq!(result.processed_count, 2);
        assert_eq!(pipeline.state(), PipelineState::Done);

        let contents = fs::read_to_string(&result.report_path).unwrap();
        // Header plus one row per document, unclassified included.
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("Unclassified"));
    }

    #[tokio::test]
    async fn progress_events_cover_all_sub_steps() {
        let docs = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("notes.txt"), "committee meeting notes").unwrap();

        let (sink, mut receiver) = ProgressSink::channel();
        let config = Config {
            search_roots: vec![docs.path().to_string_lossy().into_owned()],
            ..Config::default()
        };
        let settings = Settings {
            base_dir: docs.path().to_path_buf(),
            search_roots: vec![docs.path().to_path_buf()],
            report_dir: None,
        };
        let mut pipeline = Pipeline::new(config, settings, sink)
            .without_metadata()
            .with_tag_store(Box::new(NullTagStore));
        pipeline.pass_one().await.unwrap();
        pipeline.pass_two().await.unwrap();

        let mut steps = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let Some(step) = event.file_progress_step {
                steps.push(step);
            }
        }
        for expected in [
            step::LOADING,
            step::READING_METADATA,
            step::EXTRACTING,
            step::CLASSIFYING,
            step::ESTIMATING_EFFORT,
            step::COMPLETE,
        ] {
            assert!(steps.iter().any(|s| s == expected), "missing step {expected}");
        }
    }

    #[tokio::test]
    async fn progress_buckets_use_destination_labels() {
        let docs = tempfile::tempdir().unwrap();
        fs::write(
            docs.path().join("advising_load_advisees.txt"),
            "advising load advisees",
        )
        .unwrap();

        let (sink, mut receiver) = ProgressSink::channel();
        let config = Config {
            search_roots: vec![docs.path().to_string_lossy().into_owned()],
            ..Config::default()
        };
        let settings = Settings {
            base_dir: docs.path().to_path_buf(),
            search_roots: vec![docs.path().to_path_buf()],
            report_dir: None,
        };
        let mut pipeline = Pipeline::new(config, settings, sink)
            .without_metadata()
            .with_tag_store(Box::new(NullTagStore));
        pipeline.pass_one().await.unwrap();
        pipeline.pass_two().await.unwrap();

        let mut buckets = Vec::new();
        let mut totals_keys: Vec<String> = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let Some(bucket) = event.bucket {
                buckets.push(bucket);
            }
            totals_keys.extend(event.bucket_totals.keys().cloned());
        }
        // Buckets carry the portfolio destination label, not the category.
        assert_eq!(buckets, vec!["Primary PDF → Advising Summary".to_string()]);
        assert!(totals_keys.contains(&"Primary PDF → Advising Summary".to_string()));
        assert!(!totals_keys.contains(&"Advising".to_string()));
    }

    #[test]
    fn seeded_remote_candidates_build_clients_from_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = dir.path().join("token.json");
        fs::write(&credentials, r#"{"access_token": "ya29.seeded"}"#).unwrap();

        let config = Config {
            drives: vec![DriveSourceConfig {
                name: "archive".to_string(),
                root_folder_id: None,
                credentials_file: Some(credentials.to_string_lossy().into_owned()),
                enabled: true,
            }],
            ..Config::default()
        };
        let settings = Settings {
            base_dir: dir.path().to_path_buf(),
            search_roots: Vec::new(),
            report_dir: None,
        };
        let mut pipeline = Pipeline::new(config, settings, ProgressSink::disabled());

        let candidate = CandidateDocument::remote(
            "archive".to_string(),
            "f1".to_string(),
            "doc.pdf".to_string(),
            10,
            None,
            "application/pdf".to_string(),
        );
        pipeline.ensure_drive_client(&candidate).unwrap();
        assert!(pipeline.drive_clients.contains_key("archive"));

        let unknown = CandidateDocument::remote(
            "elsewhere".to_string(),
            "f2".to_string(),
            "doc.pdf".to_string(),
            10,
            None,
            "application/pdf".to_string(),
        );
        assert!(pipeline.ensure_drive_client(&unknown).is_err());
    }

    #[tokio::test]
    async fn unauthenticated_drive_is_skipped_not_fatal() {
        let docs = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("kept.txt"), "committee meeting").unwrap();

        let (sink, mut receiver) = ProgressSink::channel();
        let config = Config {
            search_roots: vec![docs.path().to_string_lossy().into_owned()],
            drives: vec![DriveSourceConfig {
                name: "archive".to_string(),
                root_folder_id: None,
                credentials_file: None,
                enabled: true,
            }],
            ..Config::default()
        };
        let settings = Settings {
            base_dir: docs.path().to_path_buf(),
            search_roots: vec![docs.path().to_path_buf()],
            report_dir: None,
        };
        let mut pipeline = Pipeline::new(config, settings, sink)
            .without_metadata()
            .with_drive_client("archive", Box::new(RejectingDrive));

        let candidates = pipeline.pass_one().await.unwrap().to_vec();
        assert_eq!(candidates.len(), 1);

        let mut errors = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let Some(error) = event.error {
                errors.push(error);
            }
        }
        assert!(errors.iter().any(|e| e.contains("not authenticated")));
    }

    #[tokio::test]
    async fn configured_color_rides_along_with_tags() {
        let docs = tempfile::tempdir().unwrap();
        fs::write(
            docs.path().join("advising_load_advisees.txt"),
            "advising load advisees",
        )
        .unwrap();

        let store = RecordingTagStore::default();
        let written = Arc::clone(&store.written);
        let config = Config {
            search_roots: vec![docs.path().to_string_lossy().into_owned()],
            tagging: TaggingConfig {
                enabled: true,
                colors: HashMap::from([("Advising".to_string(), "Purple".to_string())]),
            },
            ..Config::default()
        };
        let settings = Settings {
            base_dir: docs.path().to_path_buf(),
            search_roots: vec![docs.path().to_path_buf()],
            report_dir: None,
        };
        let mut pipeline = Pipeline::new(config, settings, ProgressSink::disabled())
            .without_metadata()
            .with_tag_store(Box::new(store));
        pipeline.pass_one().await.unwrap();
        let artifacts = pipeline.pass_two().await.unwrap();
        assert_eq!(artifacts[0].finder_tagged, Some(true));

        let tags = written.lock().unwrap().clone();
        assert!(tags.contains(&"Advising".to_string()));
        assert!(tags.contains(&"Primary PDF → Advising Summary".to_string()));
        assert!(tags.contains(&"Purple".to_string()));
    }

    #[tokio::test]
    async fn cancellation_stops_between_documents() {
        let docs = tempfile::tempdir().unwrap();
        fs::write(docs.path().join("a.txt"), "one").unwrap();
        fs::write(docs.path().join("b.txt"), "two").unwrap();

        let reports = tempfile::tempdir().unwrap();
        let mut pipeline = test_pipeline(docs.path(), reports.path());
        pipeline.pass_one().await.unwrap();
        pipeline.cancel_handle().store(true, Ordering::Relaxed);
        let artifacts = pipeline.pass_two().await.unwrap();
        assert!(artifacts.is_empty());
    }
}
