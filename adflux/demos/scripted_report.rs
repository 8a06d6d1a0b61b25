use std::time::Duration;

use adflux::{AdfluxError, JobDescriptor, Platform, ReportParameters, ReportTask};
use adflux_mock::{MockBehavior, MockReport, ScriptedReport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Run with `--features tracing` and RUST_LOG=debug to see the driver's events.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let task = ReportTask::builder()
        .poll_interval(Duration::from_millis(200))
        .max_attempts(3)
        .deadline(Duration::from_secs(30))
        .build()?;
    let params = ReportParameters::new()
        .with("startDate", "2024-01-01")
        .with("endDate", "2024-01-02");

    // 1. A fixture report that needs two polls before it is ready.
    let job = MockReport::new(Platform::Dv360).with_polls_before_ready(2);
    let outcome = task.run(&job, &params).await?;
    println!(
        "DV360: {} attempt(s), {} poll(s), {} column(s)",
        outcome.attempts,
        outcome.polls,
        outcome.schema.map_or(0, |s| s.fields.len())
    );
    print!("{}", outcome.content);

    // 2. A scripted report whose first readiness check fails transiently.
    let (job, ctl) = ScriptedReport::builder(Platform::Sa360)
        .fatal_signatures(["PERMISSION_DENIED"])
        .build();
    ctl.push_generate(MockBehavior::Return(JobDescriptor::new().with("reportId", "S1")))
        .await;
    ctl.push_ready(MockBehavior::Fail(AdfluxError::transport(
        "SA360",
        "status 503: backend unavailable",
    )))
    .await;
    ctl.push_ready(MockBehavior::Return(true)).await;
    let outcome = task.run(job.as_ref(), &params).await?;
    println!("SA360: recovered after {} attempt(s)", outcome.attempts);

    // 3. A fatal error stops the task at once.
    ctl.clear_all_behaviors().await;
    ctl.push_generate(MockBehavior::Fail(AdfluxError::transport(
        "SA360",
        "status 403: PERMISSION_DENIED",
    )))
    .await;
    match task.run(job.as_ref(), &params).await {
        Err(e) => println!("SA360: {e}"),
        Ok(_) => println!("SA360: unexpected success"),
    }

    Ok(())
}
