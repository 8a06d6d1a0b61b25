use std::time::Duration;

use adflux_core::{
    AdfluxError, BatchResult, ConversionUploader, JobDescriptor, Platform, ReportJob,
    ReportParameters,
};
use adflux_mock::{MockBehavior, MockUploader, ReportCall, ScriptedReport, ScriptedUploader};

#[tokio::test]
async fn ready_sequence_is_consumed_and_last_sticks() {
    let (job, ctl) = ScriptedReport::builder(Platform::Dv360).build();
    ctl.push_ready(MockBehavior::Return(false)).await;
    ctl.push_ready(MockBehavior::Fail(AdfluxError::transport("DV360", "status 503")))
        .await;
    ctl.push_ready(MockBehavior::Return(true)).await;

    let params = ReportParameters::new();
    let d = JobDescriptor::new();
    assert!(!job.is_ready(&d, &params).await.unwrap());
    assert!(job.is_ready(&d, &params).await.is_err());
    assert!(job.is_ready(&d, &params).await.unwrap());
    assert!(job.is_ready(&d, &params).await.unwrap());
    assert_eq!(ctl.count(ReportCall::IsReady).await, 4);
}

#[tokio::test]
async fn calls_and_parameters_are_logged() {
    let (job, ctl) = ScriptedReport::builder(Platform::Sa360).build();
    ctl.push_generate(MockBehavior::Return(JobDescriptor::new().with("reportId", "R1")))
        .await;
    let params = ReportParameters::new().with("startDate", "2024-01-01");

    let d = job.generate(&params).await.unwrap();
    assert_eq!(d.get("reportId"), Some("R1"));
    let content = job.get_content(&d, &params).await.unwrap();
    assert!(content.starts_with("Date,"));

    assert_eq!(
        ctl.calls().await,
        vec![ReportCall::Generate, ReportCall::GetContent]
    );
    assert_eq!(ctl.generate_params().await, vec![params]);

    ctl.clear_all_behaviors().await;
    assert!(ctl.calls().await.is_empty());
}

#[tokio::test]
async fn fatal_signatures_and_schema_are_configurable() {
    let (job, _ctl) = ScriptedReport::builder(Platform::CampaignManager)
        .synchronous()
        .fatal_signatures(["PERMISSION_DENIED"])
        .without_schema()
        .build();
    assert!(!job.is_asynchronous());
    assert!(job.is_fatal_error("status 403: PERMISSION_DENIED: nope"));
    assert!(!job.is_fatal_error("status 500"));
    assert_eq!(
        job.generate_schema().unwrap_err(),
        AdfluxError::unimplemented("generate_schema")
    );
}

#[tokio::test(start_paused = true)]
async fn hang_never_completes() {
    let (job, ctl) = ScriptedReport::builder(Platform::Dv360).build();
    ctl.push_generate(MockBehavior::Hang).await;
    let res = tokio::time::timeout(
        Duration::from_secs(60),
        job.generate(&ReportParameters::new()),
    )
    .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn scripted_uploader_logs_batches_and_maps_failures() {
    let (up, ctl) = ScriptedUploader::new_with_controller(Platform::CampaignManager);
    ctl.push_submit(MockBehavior::Fail(AdfluxError::transport("CM", "status 500: boom")))
        .await;
    ctl.push_submit(MockBehavior::Return(BatchResult::success(1))).await;

    let lines = vec!["a".to_string(), "b".to_string()];
    let first = up.submit(&lines, "b0").await;
    assert_eq!(first, BatchResult::whole_batch_failure(2, "status 500: boom"));
    let second = up.submit(&lines[..1], "b1").await;
    assert!(second.result);

    let batches = ctl.batches().await;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].0, "b0");
    assert_eq!(batches[1].1, vec!["a".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn slow_lines_delay_the_fixture_uploader() {
    let lines = vec!["{\"gclid\":\"TIMEOUT\"}".to_string()];
    let res = tokio::time::timeout(
        Duration::from_millis(50),
        MockUploader::new().submit(&lines, "slow"),
    )
    .await;
    assert!(res.is_err());
}
