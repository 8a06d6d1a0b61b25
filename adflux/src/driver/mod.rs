pub mod backoff;
pub mod task_sm;

use std::collections::VecDeque;
use std::time::Duration;

use adflux_core::{AdfluxError, ReportJob, ReportParameters, TaskConfig};

use backoff::jitter_wait;
use task_sm::{Action, Event, TaskMachine};

/// What a finished run produced, before the schema is attached.
pub struct Finished {
    pub content: String,
    pub attempts: u32,
    pub polls: u32,
}

/// Execute one report task against `job` until the machine reaches a
/// terminal phase.
pub async fn drive(
    job: &dyn ReportJob,
    params: &ReportParameters,
    cfg: &TaskConfig,
) -> Result<Finished, AdfluxError> {
    let jitter_percent = cfg.backoff.jitter_percent;
    let mut machine = TaskMachine::new(job.platform(), job.is_asynchronous(), cfg);
    let mut queue: VecDeque<Action> = VecDeque::new();

    let (next, actions) = machine.handle(Event::Start);
    machine = next;
    queue.extend(actions);

    while let Some(action) = queue.pop_front() {
        let event = match action {
            Action::Generate => match job.generate(params).await {
                Ok(descriptor) => Event::Generated(descriptor),
                Err(e) => failed(job, e),
            },
            Action::CheckReady { job: descriptor } => {
                match job.is_ready(&descriptor, params).await {
                    Ok(ready) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(platform = %job.platform(), ready, polls = machine.polls + 1, "report poll");
                        Event::Polled(ready)
                    }
                    Err(e) => failed(job, e),
                }
            }
            Action::SchedulePoll { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Event::PollTick
            }
            Action::FetchContent { job: descriptor } => {
                match job.get_content(&descriptor, params).await {
                    Ok(content) => Event::ContentFetched(content),
                    Err(e) => failed(job, e),
                }
            }
            Action::ScheduleRetry { delay_ms } => {
                let wait = jitter_wait(delay_ms, jitter_percent);
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    platform = %job.platform(),
                    attempt = machine.attempts,
                    wait_ms = wait,
                    "report attempt failed; retrying"
                );
                tokio::time::sleep(Duration::from_millis(wait)).await;
                Event::RetryTick
            }
            Action::Finish { content } => {
                return Ok(Finished {
                    content,
                    attempts: machine.attempts,
                    polls: machine.polls,
                });
            }
            Action::Fail { error } => {
                #[cfg(feature = "tracing")]
                tracing::error!(platform = %job.platform(), attempts = machine.attempts, error = %error, "report task failed");
                return Err(error);
            }
        };
        let (next, actions) = machine.handle(event);
        machine = next;
        queue.extend(actions);
    }

    Err(AdfluxError::Data(format!(
        "report task stalled in phase {:?}",
        machine.phase
    )))
}

fn failed(job: &dyn ReportJob, error: AdfluxError) -> Event {
    let fatal = job.is_fatal_error(&error.message());
    Event::CallFailed { error, fatal }
}
