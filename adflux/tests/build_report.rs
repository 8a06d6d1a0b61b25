use std::sync::Arc;
use std::time::Duration;

use adflux::{
    AdfluxError, AdsReportConfig, CmConnector, CmReportConfig, Dv360ReportConfig, Platform,
    PlatformClients, ReportConfig, ReportParameters, ReportTask, Sa360ReportConfig,
    YouTubeReportConfig, build_report,
};
use adflux_cm::adapter::{self as cm, ReportFile, ReportFileUrls};
use adflux_core::{AdsReportQuery, UserProfile};
use adflux_platforms::adapter::{
    AdsApi, Dv360Api, Dv360Run, Sa360Api, Sa360File, Sa360Status, YouTubeApi, YouTubePage,
};
use serde_json::json;

struct Cm {
    p: Arc<dyn cm::CmProfiles>,
    r: Arc<dyn cm::CmReports>,
}
impl cm::CloneArcAdapters for Cm {
    fn clone_arc_profiles(&self) -> Arc<dyn cm::CmProfiles> {
        self.p.clone()
    }
    fn clone_arc_reports(&self) -> Arc<dyn cm::CmReports> {
        self.r.clone()
    }
}

fn cm_connector() -> CmConnector {
    let profiles = <dyn cm::CmProfiles>::from_fn(|| {
        Ok(vec![UserProfile {
            profile_id: "P1".into(),
            account_id: "A1".into(),
            ..Default::default()
        }])
    });
    let reports = <dyn cm::CmReports>::from_fns(
        |_, _| {
            Ok(ReportFile {
                id: "F1".into(),
                status: "PROCESSING".into(),
                urls: None,
            })
        },
        |_, _, _| {
            Ok(ReportFile {
                id: "F1".into(),
                status: "REPORT_AVAILABLE".into(),
                urls: Some(ReportFileUrls {
                    api_url: Some("https://cm.example/files/F1?alt=media".into()),
                    browser_url: None,
                }),
            })
        },
        |_| Ok("Date,Clicks\n2024-01-01,3\n".into()),
    );
    CmConnector::from_adapter(&Cm { p: profiles, r: reports })
}

fn dv360() -> Arc<dyn Dv360Api> {
    let run = |state: &str| Dv360Run {
        query_id: "Q1".into(),
        report_id: "R1".into(),
        state: state.into(),
        gcs_path: (state == "DONE").then(|| "https://storage.example/r1.csv".to_string()),
    };
    <dyn Dv360Api>::from_fns(
        move |_, _| Ok(run("QUEUED")),
        move |_, _| Ok(run("DONE")),
        |_| Ok("Date,Impressions\n2024-01-01,10\n".into()),
    )
}

fn sa360() -> Arc<dyn Sa360Api> {
    let status = |ready: bool| Sa360Status {
        id: "S1".into(),
        is_report_ready: ready,
        files: if ready {
            vec![Sa360File {
                url: "https://sa360.example/S1/0".into(),
                byte_count: None,
            }]
        } else {
            Vec::new()
        },
    };
    <dyn Sa360Api>::from_fns(
        move |_| Ok(status(false)),
        move |_| Ok(status(true)),
        |_, _| Ok("date,clicks\n2024-01-01,5\n".into()),
    )
}

fn ads() -> Arc<dyn AdsApi> {
    <dyn AdsApi>::from_fn(|_| Ok(vec![json!({"campaign": {"id": "11"}})]))
}

fn youtube() -> Arc<dyn YouTubeApi> {
    <dyn YouTubeApi>::from_fn(|_, _, _| {
        Ok(YouTubePage {
            items: vec![json!({"id": "v1", "snippet": {"title": "Launch"}})],
            next_page_token: None,
        })
    })
}

fn all_clients() -> PlatformClients {
    PlatformClients::new()
        .with_cm(cm_connector())
        .with_dv360(dv360())
        .with_sa360(sa360())
        .with_ads(ads())
        .with_youtube(youtube())
}

fn configs() -> Vec<ReportConfig> {
    vec![
        ReportConfig::CampaignManager(CmReportConfig {
            account_id: Some("A1".into()),
            profile_id: None,
            report_id: "R1".into(),
        }),
        ReportConfig::Dv360(Dv360ReportConfig {
            query_id: "Q1".into(),
            request_body: None,
        }),
        ReportConfig::Sa360(Sa360ReportConfig {
            request: json!({
                "reportType": "campaign",
                "columns": [{"columnName": "date"}, {"columnName": "clicks"}]
            }),
        }),
        ReportConfig::GoogleAds(AdsReportConfig {
            developer_token: "dev".into(),
            customer_id: Some("123".into()),
            login_customer_id: None,
            report_query: Some(AdsReportQuery {
                fields: vec!["campaign.id".into()],
                from: "campaign".into(),
                conditions: Vec::new(),
            }),
        }),
        ReportConfig::YouTube(YouTubeReportConfig {
            target: "video".into(),
            result_limit: None,
            report_query: Some(json!({"id": "v1"})),
        }),
    ]
}

fn task() -> ReportTask {
    ReportTask::builder()
        .poll_interval(Duration::from_secs(1))
        .build()
        .unwrap()
}

#[test]
fn every_platform_dispatches_to_its_job() {
    let clients = all_clients();
    assert_eq!(clients.platforms().len(), 5);
    for config in configs() {
        let job = build_report(&config, &clients).unwrap();
        assert_eq!(job.platform(), config.platform());
        let expect_async = !matches!(config.platform(), Platform::GoogleAds | Platform::YouTube);
        assert_eq!(job.is_asynchronous(), expect_async, "{}", config.platform());
    }
}

#[test]
fn missing_client_is_a_configuration_error() {
    let clients = PlatformClients::new().with_dv360(dv360());
    assert_eq!(clients.platforms(), vec![Platform::Dv360]);
    for config in configs() {
        let built = build_report(&config, &clients);
        if config.platform() == Platform::Dv360 {
            assert!(built.is_ok());
        } else {
            let err = built.err().unwrap();
            assert_eq!(
                err,
                AdfluxError::config(format!("no {} client registered", config.platform()))
            );
        }
    }
}

#[test]
fn invalid_platform_config_is_rejected_at_build() {
    let config = ReportConfig::Dv360(Dv360ReportConfig {
        query_id: "  ".into(),
        request_body: None,
    });
    let err = build_report(&config, &all_clients()).err().unwrap();
    assert!(err.is_configuration());
}

#[tokio::test(start_paused = true)]
async fn built_jobs_run_to_content() {
    let clients = all_clients();
    let params = ReportParameters::new()
        .with("startDate", "2024-01-01")
        .with("endDate", "2024-01-01");
    let mut contents = Vec::new();
    for config in configs() {
        let job = build_report(&config, &clients).unwrap();
        let outcome = task().run(job.as_ref(), &params).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        if job.is_asynchronous() {
            assert_eq!(outcome.polls, 1);
        } else {
            assert_eq!(outcome.polls, 0);
        }
        assert!(outcome.schema.is_some());
        contents.push(outcome.content);
    }
    assert_eq!(contents[0], "Date,Clicks\n2024-01-01,3\n");
    assert_eq!(contents[1], "Date,Impressions\n2024-01-01,10\n");
    assert_eq!(contents[2], "date,clicks\n2024-01-01,5\n");
    assert!(contents[3].starts_with("campaign_id\n"));
    assert!(contents[4].contains("\"v1\""));
}

#[test]
fn configs_deserialize_from_tagged_json() {
    let config: ReportConfig = serde_json::from_value(json!({
        "target": "DV360",
        "config": {"queryId": "Q1"}
    }))
    .unwrap();
    let job = build_report(&config, &all_clients()).unwrap();
    assert_eq!(job.platform(), Platform::Dv360);
}
