use std::collections::VecDeque;
use std::sync::Arc;

use adflux_core::report::matches_any;
use adflux_core::{
    AdfluxError, BatchResult, ConversionUploader, JobDescriptor, Platform, ReportJob,
    ReportParameters, TableSchema,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::fixtures;

/// Instruction for how one call should behave.
#[derive(Clone, Debug)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(AdfluxError),
    /// Hang indefinitely (simulate a stalled remote call).
    Hang,
}

/// One recorded report job call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportCall {
    /// `generate`
    Generate,
    /// `is_ready`
    IsReady,
    /// `get_content`
    GetContent,
}

/// Behaviors are consumed front to back; the last one sticks.
fn next<T: Clone>(queue: &mut VecDeque<MockBehavior<T>>) -> Option<MockBehavior<T>> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

async fn play<T>(behavior: MockBehavior<T>) -> Result<T, AdfluxError> {
    match behavior {
        MockBehavior::Return(v) => Ok(v),
        MockBehavior::Fail(e) => Err(e),
        MockBehavior::Hang => {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }
}

#[derive(Default)]
struct ReportState {
    generate: VecDeque<MockBehavior<JobDescriptor>>,
    ready: VecDeque<MockBehavior<bool>>,
    content: VecDeque<MockBehavior<String>>,
    calls: Vec<ReportCall>,
    params: Vec<ReportParameters>,
}

/// Controller handle used by tests to drive a [`ScriptedReport`].
#[derive(Clone)]
pub struct ScriptedReportController {
    state: Arc<Mutex<ReportState>>,
}

impl ScriptedReportController {
    /// Queue the outcome of the next `generate` call.
    pub async fn push_generate(&self, behavior: MockBehavior<JobDescriptor>) {
        self.state.lock().await.generate.push_back(behavior);
    }

    /// Queue the outcome of the next `is_ready` call.
    pub async fn push_ready(&self, behavior: MockBehavior<bool>) {
        self.state.lock().await.ready.push_back(behavior);
    }

    /// Queue the outcome of the next `get_content` call.
    pub async fn push_content(&self, behavior: MockBehavior<String>) {
        self.state.lock().await.content.push_back(behavior);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<ReportCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls of one kind made so far.
    pub async fn count(&self, call: ReportCall) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    /// Parameters passed to each `generate` call.
    pub async fn generate_params(&self) -> Vec<ReportParameters> {
        self.state.lock().await.params.clone()
    }

    /// Clear all queued behaviors and the call log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.generate.clear();
        guard.ready.clear();
        guard.content.clear();
        guard.calls.clear();
        guard.params.clear();
    }
}

/// A report job that defers all behavior to a [`ScriptedReportController`].
///
/// With nothing queued, `generate` returns an empty descriptor, `is_ready`
/// answers `true` and `get_content` returns the fixture content for the
/// platform.
pub struct ScriptedReport {
    platform: Platform,
    asynchronous: bool,
    fatal_signatures: Vec<String>,
    schema: Option<TableSchema>,
    state: Arc<Mutex<ReportState>>,
}

/// Builder for [`ScriptedReport`].
pub struct ScriptedReportBuilder {
    platform: Platform,
    asynchronous: bool,
    fatal_signatures: Vec<String>,
    schema: Option<TableSchema>,
}

impl ScriptedReport {
    /// Start building a scripted report for `platform`.
    #[must_use]
    pub fn builder(platform: Platform) -> ScriptedReportBuilder {
        ScriptedReportBuilder {
            platform,
            asynchronous: true,
            fatal_signatures: Vec::new(),
            schema: Some(fixtures::schema(platform)),
        }
    }
}

impl ScriptedReportBuilder {
    /// Report without a polling phase.
    #[must_use]
    pub fn synchronous(mut self) -> Self {
        self.asynchronous = false;
        self
    }

    /// Error fragments `is_fatal_error` matches.
    #[must_use]
    pub fn fatal_signatures<I, S>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fatal_signatures = signatures.into_iter().map(Into::into).collect();
        self
    }

    /// Report whose `generate_schema` is unimplemented.
    #[must_use]
    pub fn without_schema(mut self) -> Self {
        self.schema = None;
        self
    }

    /// Create the report and its controller.
    #[must_use]
    pub fn build(self) -> (Arc<dyn ReportJob>, ScriptedReportController) {
        let state = Arc::new(Mutex::new(ReportState::default()));
        let controller = ScriptedReportController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(ScriptedReport {
            platform: self.platform,
            asynchronous: self.asynchronous,
            fatal_signatures: self.fatal_signatures,
            schema: self.schema,
            state,
        });
        (me as Arc<dyn ReportJob>, controller)
    }
}

#[async_trait]
impl ReportJob for ScriptedReport {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        // Snapshot the behavior without holding the lock across the call.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(ReportCall::Generate);
            guard.params.push(params.clone());
            next(&mut guard.generate)
                .unwrap_or_else(|| MockBehavior::Return(JobDescriptor::new()))
        };
        play(behavior).await
    }

    async fn is_ready(
        &self,
        _job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(ReportCall::IsReady);
            next(&mut guard.ready).unwrap_or(MockBehavior::Return(true))
        };
        play(behavior).await
    }

    async fn get_content(
        &self,
        _job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(ReportCall::GetContent);
            next(&mut guard.content).unwrap_or_else(|| {
                MockBehavior::Return(fixtures::content(self.platform).to_string())
            })
        };
        play(behavior).await
    }

    fn is_fatal_error(&self, message: &str) -> bool {
        let signatures: Vec<&str> = self.fatal_signatures.iter().map(String::as_str).collect();
        matches_any(message, &signatures)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        self.schema
            .clone()
            .ok_or_else(|| AdfluxError::unimplemented("generate_schema"))
    }

    fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }
}

#[derive(Default)]
struct UploadState {
    submit: VecDeque<MockBehavior<BatchResult>>,
    batches: Vec<(String, Vec<String>)>,
}

/// Controller handle used by tests to drive a [`ScriptedUploader`].
#[derive(Clone)]
pub struct ScriptedUploaderController {
    state: Arc<Mutex<UploadState>>,
}

impl ScriptedUploaderController {
    /// Queue the outcome of the next `submit` call.
    ///
    /// `Fail` is reported as a whole-batch failure carrying the error message.
    pub async fn push_submit(&self, behavior: MockBehavior<BatchResult>) {
        self.state.lock().await.submit.push_back(behavior);
    }

    /// Every submitted batch as `(batch_id, lines)`, in call order.
    pub async fn batches(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().await.batches.clone()
    }
}

/// A conversion uploader that defers all behavior to a
/// [`ScriptedUploaderController`]. With nothing queued every batch succeeds.
pub struct ScriptedUploader {
    platform: Platform,
    state: Arc<Mutex<UploadState>>,
}

impl ScriptedUploader {
    /// Create a scripted uploader and its controller.
    #[must_use]
    pub fn new_with_controller(
        platform: Platform,
    ) -> (Arc<dyn ConversionUploader>, ScriptedUploaderController) {
        let state = Arc::new(Mutex::new(UploadState::default()));
        let controller = ScriptedUploaderController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { platform, state });
        (me as Arc<dyn ConversionUploader>, controller)
    }
}

#[async_trait]
impl ConversionUploader for ScriptedUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn submit(&self, lines: &[String], batch_id: &str) -> BatchResult {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.batches.push((batch_id.to_string(), lines.to_vec()));
            next(&mut guard.submit)
        };
        match behavior {
            None => BatchResult::success(lines.len()),
            Some(b) => play(b)
                .await
                .unwrap_or_else(|e| BatchResult::whole_batch_failure(lines.len(), e.message())),
        }
    }
}
