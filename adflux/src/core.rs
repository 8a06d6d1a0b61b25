use std::time::Duration;

use adflux_core::{
    AdfluxError, BackoffConfig, ReportJob, ReportParameters, TableSchema, TaskConfig,
};

use crate::driver;

/// Result of a successful report task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Report content as returned by the platform.
    pub content: String,
    /// Load schema of the content; `None` when the report does not define one.
    pub schema: Option<TableSchema>,
    /// `generate` calls made, including the successful one.
    pub attempts: u32,
    /// Readiness checks made across all attempts.
    pub polls: u32,
}

/// Drives [`ReportJob`]s from generation to content.
///
/// One task may run many jobs; it holds configuration only.
#[derive(Debug, Clone)]
pub struct ReportTask {
    pub(crate) cfg: TaskConfig,
}

/// Builder for constructing a [`ReportTask`] with custom configuration.
#[derive(Debug, Clone)]
pub struct ReportTaskBuilder {
    cfg: TaskConfig,
}

impl Default for ReportTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTaskBuilder {
    /// Create a new builder with the defaults of [`TaskConfig`]: a 30 s poll
    /// interval, 3 attempts, no deadline and the default backoff.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cfg: TaskConfig::default(),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: TaskConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Wait between two readiness checks.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll_interval = interval;
        self
    }

    /// Total attempts, each starting with `generate`, before giving up.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.cfg.max_attempts = attempts;
        self
    }

    /// Overall deadline for one run, polling included.
    ///
    /// When exceeded the run returns `RequestTimeout("report")`. Without a
    /// deadline a job that never becomes ready is polled forever.
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.cfg.deadline = Some(deadline);
        self
    }

    /// Delay policy between failed attempts.
    #[must_use]
    pub const fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.cfg.backoff = backoff;
        self
    }

    /// Build the task.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when `max_attempts` is zero, the backoff
    /// factor is zero, the jitter exceeds 100 percent or the minimum backoff
    /// exceeds the maximum.
    pub fn build(self) -> Result<ReportTask, AdfluxError> {
        let b = &self.cfg.backoff;
        if self.cfg.max_attempts == 0 {
            return Err(AdfluxError::config("max_attempts must be at least 1"));
        }
        if b.factor == 0 {
            return Err(AdfluxError::config("backoff factor must be at least 1"));
        }
        if b.jitter_percent > 100 {
            return Err(AdfluxError::config("backoff jitter_percent must be within 0..=100"));
        }
        if b.min_backoff_ms > b.max_backoff_ms {
            return Err(AdfluxError::config(
                "backoff min_backoff_ms must not exceed max_backoff_ms",
            ));
        }
        Ok(ReportTask { cfg: self.cfg })
    }
}

impl ReportTask {
    /// Start building a new task.
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let task = adflux::ReportTask::builder()
    ///     .poll_interval(Duration::from_secs(10))
    ///     .max_attempts(5)
    ///     .deadline(Duration::from_secs(3600))
    ///     .build()?;
    /// let outcome = task.run(job.as_ref(), &params).await?;
    /// ```
    #[must_use]
    pub fn builder() -> ReportTaskBuilder {
        ReportTaskBuilder::new()
    }

    /// The configuration this task runs with.
    #[must_use]
    pub const fn config(&self) -> &TaskConfig {
        &self.cfg
    }

    /// Run `job` to completion.
    ///
    /// Calls `generate`, polls `is_ready` every `poll_interval` for
    /// asynchronous jobs, then fetches the content. A failed call restarts
    /// the job from `generate` after the backoff delay unless the error is a
    /// terminal fault (see [`AdfluxError::is_terminal`]) or the job
    /// classifies it as fatal.
    ///
    /// # Errors
    /// - terminal faults, including a failing `generate_schema`, as-is;
    /// - `FatalJob` for errors the job classifies as fatal;
    /// - `RetriesExhausted` once `max_attempts` attempts have failed;
    /// - `RequestTimeout("report")` when the deadline elapses.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "adflux::report_task::run",
            skip(self, job, params),
            fields(platform = %job.platform(), asynchronous = job.is_asynchronous()),
        )
    )]
    pub async fn run(
        &self,
        job: &dyn ReportJob,
        params: &ReportParameters,
    ) -> Result<TaskOutcome, AdfluxError> {
        // Schema faults surface before any remote call.
        let schema = match job.generate_schema() {
            Ok(schema) => Some(schema),
            Err(AdfluxError::Unimplemented { .. }) => None,
            Err(e) => return Err(e),
        };
        let finished = with_request_deadline(
            self.cfg.deadline,
            "report",
            driver::drive(job, params, &self.cfg),
        )
        .await??;
        Ok(TaskOutcome {
            content: finished.content,
            schema,
            attempts: finished.attempts,
            polls: finished.polls,
        })
    }
}

/// Apply an optional deadline to `fut`, mapping expiry to `RequestTimeout(operation)`.
pub(crate) async fn with_request_deadline<T, F>(
    deadline: Option<Duration>,
    operation: &str,
    fut: F,
) -> Result<T, AdfluxError>
where
    F: std::future::Future<Output = T>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| AdfluxError::request_timeout(operation)),
        None => Ok(fut.await),
    }
}
