//! Pure state machine behind [`crate::ReportTask`].
//!
//! The machine never performs I/O. The driver feeds it one [`Event`] per
//! completed call and executes the returned [`Action`]s.

use adflux_core::{AdfluxError, JobDescriptor, Platform, TaskConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No job yet, or `generate` in flight.
    Created,
    /// Job started; waiting for the platform to finish it.
    Pending { job: JobDescriptor },
    /// Job finished remotely; content being fetched.
    Ready { job: JobDescriptor },
    /// Last attempt failed; waiting out the backoff before regenerating.
    Retrying,
    Done,
    Failed { fatal: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Start,
    Generated(JobDescriptor),
    Polled(bool),
    PollTick,
    ContentFetched(String),
    /// A job call failed. `fatal` is the job's own classification.
    CallFailed { error: AdfluxError, fatal: bool },
    RetryTick,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Generate,
    CheckReady { job: JobDescriptor },
    SchedulePoll { delay_ms: u64 },
    FetchContent { job: JobDescriptor },
    ScheduleRetry { delay_ms: u64 },
    Finish { content: String },
    Fail { error: AdfluxError },
}

#[derive(Clone, Debug)]
pub struct TaskMachine {
    pub platform: Platform,
    pub asynchronous: bool,
    pub max_attempts: u32,
    /// `generate` calls made so far.
    pub attempts: u32,
    /// `is_ready` calls made so far, across attempts.
    pub polls: u32,
    pub poll_interval_ms: u64,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub factor: u32,
    pub phase: Phase,
}

impl TaskMachine {
    pub fn new(platform: Platform, asynchronous: bool, cfg: &TaskConfig) -> Self {
        Self {
            platform,
            asynchronous,
            max_attempts: cfg.max_attempts,
            attempts: 0,
            polls: 0,
            poll_interval_ms: u64::try_from(cfg.poll_interval.as_millis()).unwrap_or(u64::MAX),
            backoff_ms: cfg.backoff.min_backoff_ms,
            max_backoff_ms: cfg.backoff.max_backoff_ms,
            factor: cfg.backoff.factor,
            phase: Phase::Created,
        }
    }

    pub fn handle(mut self, event: Event) -> (Self, Vec<Action>) {
        let prev_phase = std::mem::replace(&mut self.phase, Phase::Created);
        match (prev_phase, event) {
            (Phase::Created, Event::Start) | (Phase::Retrying, Event::RetryTick) => {
                self.attempts += 1;
                (self, vec![Action::Generate])
            }
            (Phase::Created, Event::Generated(job)) => {
                if self.asynchronous {
                    let action = Action::CheckReady { job: job.clone() };
                    (Self { phase: Phase::Pending { job }, ..self }, vec![action])
                } else {
                    let action = Action::FetchContent { job: job.clone() };
                    (Self { phase: Phase::Ready { job }, ..self }, vec![action])
                }
            }
            (Phase::Pending { job }, Event::Polled(false)) => {
                self.polls += 1;
                let delay_ms = self.poll_interval_ms;
                (
                    Self { phase: Phase::Pending { job }, ..self },
                    vec![Action::SchedulePoll { delay_ms }],
                )
            }
            (Phase::Pending { job }, Event::Polled(true)) => {
                self.polls += 1;
                let action = Action::FetchContent { job: job.clone() };
                (Self { phase: Phase::Ready { job }, ..self }, vec![action])
            }
            (Phase::Pending { job }, Event::PollTick) => {
                let action = Action::CheckReady { job: job.clone() };
                (Self { phase: Phase::Pending { job }, ..self }, vec![action])
            }
            (Phase::Ready { .. }, Event::ContentFetched(content)) => {
                (Self { phase: Phase::Done, ..self }, vec![Action::Finish { content }])
            }
            (
                Phase::Created | Phase::Pending { .. } | Phase::Ready { .. },
                Event::CallFailed { error, fatal },
            ) => self.on_failure(error, fatal),
            // Terminal phases and out-of-order events produce nothing.
            (phase, _) => (Self { phase, ..self }, Vec::new()),
        }
    }

    fn on_failure(self, error: AdfluxError, fatal: bool) -> (Self, Vec<Action>) {
        if error.is_terminal() {
            return (
                Self { phase: Phase::Failed { fatal: true }, ..self },
                vec![Action::Fail { error }],
            );
        }
        if fatal {
            let error = AdfluxError::FatalJob {
                platform: self.platform.as_str().to_string(),
                msg: error.message(),
            };
            return (
                Self { phase: Phase::Failed { fatal: true }, ..self },
                vec![Action::Fail { error }],
            );
        }
        if self.attempts >= self.max_attempts {
            let error = AdfluxError::RetriesExhausted {
                attempts: self.attempts,
                last: error.message(),
            };
            return (
                Self { phase: Phase::Failed { fatal: false }, ..self },
                vec![Action::Fail { error }],
            );
        }
        let delay_ms = self.backoff_ms;
        let backoff_ms = self
            .backoff_ms
            .saturating_mul(self.factor.into())
            .min(self.max_backoff_ms);
        (
            Self { phase: Phase::Retrying, backoff_ms, ..self },
            vec![Action::ScheduleRetry { delay_ms }],
        )
    }

    #[cfg(test)]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Done | Phase::Failed { .. })
    }
}
