use std::collections::BTreeMap;
use std::sync::Arc;

use adflux_cm::CmConnector;
use adflux_cm::adapter::{CmProfiles, CmReports, RealAdapter};
use adflux_core::{
    AdfluxError, BatchConfig, BatchResult, CmReportConfig, ConversionUploader, FixedClock,
    ReportJob, ReportParameters,
};
use httpmock::prelude::*;
use serde_json::json;

fn adapter(server: &MockServer) -> RealAdapter {
    RealAdapter::new_default("tok")
        .with_base_url(&server.base_url())
        .unwrap()
}

fn config() -> BatchConfig {
    serde_json::from_value(json!({
        "profileId": "p1",
        "idType": "gclid",
        "conversion": {"floodlightConfigurationId": "fc", "floodlightActivityId": "fa"}
    }))
    .unwrap()
}

#[tokio::test]
async fn batchinsert_partial_failure_end_to_end() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/userprofiles/p1/conversions/batchinsert")
                .header("authorization", "Bearer tok")
                .json_body(json!({
                    "conversions": [
                        {
                            "gclid": "G1",
                            "ordinal": "5",
                            "timestampMicros": "5000",
                            "floodlightConfigurationId": "fc",
                            "floodlightActivityId": "fa"
                        },
                        {
                            "gclid": "G2",
                            "ordinal": "5",
                            "timestampMicros": "5000",
                            "value": 9.5,
                            "floodlightConfigurationId": "fc",
                            "floodlightActivityId": "fa"
                        }
                    ]
                }));
            then.status(200).json_body(json!({
                "kind": "dfareporting#conversionsBatchInsertResponse",
                "hasFailures": true,
                "status": [
                    {"kind": "dfareporting#conversionStatus"},
                    {
                        "kind": "dfareporting#conversionStatus",
                        "errors": [{
                            "code": "INVALID_ARGUMENT",
                            "message": "Conversion 2 error: INVALID_GCLID",
                            "kind": "dfareporting#conversionError"
                        }]
                    }
                ]
            }));
        })
        .await;

    let up = CmConnector::new_with_adapter(&adapter(&server))
        .with_clock(Arc::new(FixedClock(5)))
        .uploader(config())
        .unwrap();
    let lines = vec![
        r#"{"gclid":"G1","extra":"dropped"}"#.to_string(),
        r#"{"gclid":"G2","value":9.5}"#.to_string(),
    ];
    let r = up.submit(&lines, "http-1").await;

    m.assert_async().await;
    assert!(!r.result);
    assert_eq!(r.failed_lines, Some(vec![lines[1].clone()]));
    assert_eq!(
        r.grouped_failed,
        Some(BTreeMap::from([(
            "INVALID_GCLID".to_string(),
            vec![lines[1].clone()]
        )]))
    );
}

#[tokio::test]
async fn http_error_fails_whole_batch_with_platform_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/userprofiles/p1/conversions/batchinsert");
            then.status(403).json_body(json!({
                "error": {
                    "code": 403,
                    "message": "The caller does not have permission",
                    "status": "PERMISSION_DENIED"
                }
            }));
        })
        .await;

    let up = CmConnector::new_with_adapter(&adapter(&server))
        .uploader(config())
        .unwrap();
    let r = up.submit(&[r#"{"gclid":"G1"}"#.to_string()], "http-2").await;
    assert_eq!(
        r,
        BatchResult::whole_batch_failure(
            1,
            "status 403: conversions.batchinsert: PERMISSION_DENIED: The caller does not have permission"
        )
    );
}

#[tokio::test]
async fn user_profiles_are_listed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userprofiles").header("authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "kind": "dfareporting#userProfileList",
                "items": [{
                    "profileId": "P1",
                    "userName": "ops",
                    "accountId": "A1",
                    "accountName": "Acme"
                }]
            }));
        })
        .await;

    let profiles = adapter(&server).list_user_profiles().await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].profile_id, "P1");
    assert_eq!(profiles[0].account_name, "Acme");
}

#[tokio::test]
async fn report_runs_polls_and_downloads() {
    let server = MockServer::start_async().await;
    let api_url = server.url("/download/F1");
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userprofiles");
            then.status(200).json_body(json!({
                "items": [{"profileId": "P1", "accountId": "A1"}]
            }));
        })
        .await;
    let run = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/userprofiles/P1/reports/R1/run")
                .query_param("synchronous", "false");
            then.status(200)
                .json_body(json!({"id": "F1", "status": "PROCESSING"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userprofiles/P1/reports/R1/files/F1");
            then.status(200).json_body(json!({
                "id": "F1",
                "status": "REPORT_AVAILABLE",
                "urls": {"apiUrl": api_url, "browserUrl": "https://cm.example/F1"}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/download/F1")
                .header("authorization", "Bearer tok");
            then.status(200).body("Date,Impressions\n2024-01-01,10\n");
        })
        .await;

    let job = CmConnector::new_with_adapter(&adapter(&server))
        .report(&CmReportConfig {
            account_id: Some("A1".into()),
            profile_id: None,
            report_id: "R1".into(),
        })
        .unwrap();
    let params = ReportParameters::new();
    let d = job.generate(&params).await.unwrap();
    run.assert_async().await;
    assert_eq!(d.get("fileId"), Some("F1"));
    assert!(job.is_ready(&d, &params).await.unwrap());
    assert_eq!(
        job.get_content(&d, &params).await.unwrap(),
        "Date,Impressions\n2024-01-01,10\n"
    );
}

#[tokio::test]
async fn malformed_response_is_a_data_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userprofiles/P1/reports/R1/files/F1");
            then.status(200).body("<html>not json</html>");
        })
        .await;
    let err = adapter(&server)
        .get_file("P1", "R1", "F1")
        .await
        .unwrap_err();
    assert!(matches!(err, AdfluxError::Data(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let a = RealAdapter::new_default("tok")
        .with_base_url("http://127.0.0.1:1/")
        .unwrap();
    match a.list_user_profiles().await.unwrap_err() {
        AdfluxError::Transport { platform, .. } => assert_eq!(platform, "CM"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn base_url_must_be_absolute() {
    let err = RealAdapter::new_default("tok")
        .with_base_url("not a url")
        .unwrap_err();
    assert!(err.is_configuration());
}
