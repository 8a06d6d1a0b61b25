#![cfg(feature = "test-adapters")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adflux_cm::adapter::{ReportFile, ReportFileUrls};
use adflux_cm::{CmConnector, adapter};
use adflux_core::{
    AdfluxError, CmReportConfig, JobDescriptor, Platform, ReportJob, ReportParameters,
    UserProfile,
};

struct Combo {
    p: Arc<dyn adapter::CmProfiles>,
    r: Arc<dyn adapter::CmReports>,
}
impl adapter::CloneArcAdapters for Combo {
    fn clone_arc_profiles(&self) -> Arc<dyn adapter::CmProfiles> {
        self.p.clone()
    }
    fn clone_arc_reports(&self) -> Arc<dyn adapter::CmReports> {
        self.r.clone()
    }
}

fn file(id: &str, status: &str) -> ReportFile {
    ReportFile {
        id: id.into(),
        status: status.into(),
        urls: (status == "REPORT_AVAILABLE").then(|| ReportFileUrls {
            api_url: Some(format!("https://cm.example/files/{id}?alt=media")),
            browser_url: None,
        }),
    }
}

fn profiles() -> Arc<dyn adapter::CmProfiles> {
    <dyn adapter::CmProfiles>::from_fn(|| {
        Ok(vec![
            UserProfile {
                profile_id: "P7".into(),
                account_id: "A1".into(),
                ..Default::default()
            },
            UserProfile {
                profile_id: "P8".into(),
                account_id: "A2".into(),
                ..Default::default()
            },
        ])
    })
}

/// Reports adapter whose file status is read from `status`.
fn reports(status: Arc<Mutex<String>>) -> Arc<dyn adapter::CmReports> {
    <dyn adapter::CmReports>::from_fns(
        |profile, report| {
            assert_eq!(report, "R1");
            Ok(file(&format!("F-{profile}"), "PROCESSING"))
        },
        move |_, _, file_id| Ok(file(&file_id, &status.lock().unwrap())),
        |url| Ok(format!("csv from {url}")),
    )
}

fn job_for(config: &CmReportConfig, status: Arc<Mutex<String>>) -> adflux_cm::CmReport {
    CmConnector::from_adapter(&Combo { p: profiles(), r: reports(status) })
        .report(config)
        .unwrap()
}

fn account_config() -> CmReportConfig {
    CmReportConfig {
        account_id: Some("A1".into()),
        profile_id: None,
        report_id: "R1".into(),
    }
}

#[tokio::test]
async fn generate_resolves_profile_from_account() {
    let job = job_for(&account_config(), Arc::new(Mutex::new("PROCESSING".into())));
    let d = job.generate(&ReportParameters::new()).await.unwrap();
    assert_eq!(d.get("profileId"), Some("P7"));
    assert_eq!(d.get("reportId"), Some("R1"));
    assert_eq!(d.get("fileId"), Some("F-P7"));
    assert_eq!(job.platform(), Platform::CampaignManager);
    assert!(job.is_asynchronous());
}

#[tokio::test]
async fn explicit_profile_never_lists_profiles() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let p = <dyn adapter::CmProfiles>::from_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    });
    let status = Arc::new(Mutex::new("PROCESSING".to_string()));
    let job = CmConnector::from_adapter(&Combo { p, r: reports(status) })
        .report(&CmReportConfig {
            account_id: Some("A1".into()),
            profile_id: Some("P9".into()),
            report_id: "R1".into(),
        })
        .unwrap();

    let d = job.generate(&ReportParameters::new()).await.unwrap();
    assert_eq!(d.get("fileId"), Some("F-P9"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn status_vocabulary_maps_to_readiness() {
    let status = Arc::new(Mutex::new("PROCESSING".to_string()));
    let job = job_for(&account_config(), Arc::clone(&status));
    let params = ReportParameters::new();
    let d = job.generate(&params).await.unwrap();

    assert!(!job.is_ready(&d, &params).await.unwrap());

    *status.lock().unwrap() = "REPORT_AVAILABLE".into();
    assert!(job.is_ready(&d, &params).await.unwrap());
    assert_eq!(
        job.get_content(&d, &params).await.unwrap(),
        "csv from https://cm.example/files/F-P7?alt=media"
    );

    *status.lock().unwrap() = "EXPIRED".into();
    let err = job.is_ready(&d, &params).await.unwrap_err();
    assert_eq!(err, AdfluxError::unsupported_status("CM", "EXPIRED"));
}

#[tokio::test]
async fn content_before_availability_is_an_error() {
    let job = job_for(&account_config(), Arc::new(Mutex::new("PROCESSING".into())));
    let params = ReportParameters::new();
    let d = job.generate(&params).await.unwrap();
    assert!(matches!(
        job.get_content(&d, &params).await,
        Err(AdfluxError::UnsupportedStatus { .. })
    ));
}

#[tokio::test]
async fn descriptor_without_ids_is_a_data_error() {
    let job = job_for(&account_config(), Arc::new(Mutex::new("PROCESSING".into())));
    let err = job
        .is_ready(&JobDescriptor::new(), &ReportParameters::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AdfluxError::Data(_)));
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let job = job_for(
        &CmReportConfig {
            account_id: Some("A404".into()),
            profile_id: None,
            report_id: "R1".into(),
        },
        Arc::new(Mutex::new("PROCESSING".into())),
    );
    let err = job.generate(&ReportParameters::new()).await.unwrap_err();
    assert!(matches!(err, AdfluxError::NotFound { .. }));
}

#[test]
fn report_config_without_ids_is_refused() {
    let c = CmConnector::from_adapter(&Combo {
        p: profiles(),
        r: reports(Arc::new(Mutex::new(String::new()))),
    });
    let err = c
        .report(&CmReportConfig {
            account_id: None,
            profile_id: Some(String::new()),
            report_id: "R1".into(),
        })
        .err()
        .unwrap();
    assert!(matches!(err, AdfluxError::Config(_)));
    assert!(c.report(&CmReportConfig::default()).is_err());
}

#[test]
fn fatal_classification_and_schema() {
    let job = job_for(&account_config(), Arc::new(Mutex::new(String::new())));
    assert!(job.is_fatal_error("status 403: reports.run: PERMISSION_DENIED: no access"));
    assert!(job.is_fatal_error("status 404: reports.files.get: NOT_FOUND: gone"));
    assert!(!job.is_fatal_error("status 503: reports.run: backend unavailable"));

    let schema = job.generate_schema().unwrap();
    assert!(schema.names().any(|n| n == "Impressions"));
}

#[tokio::test]
async fn describe_profiles_lists_one_line_per_profile() {
    let c = CmConnector::from_adapter(&Combo {
        p: profiles(),
        r: reports(Arc::new(Mutex::new(String::new()))),
    });
    let lines = c.describe_profiles().await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Profile: P7[] Account: A1[]");
}
