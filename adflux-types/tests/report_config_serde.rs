use adflux_types::{Platform, ReportConfig};

#[test]
fn cm_report_config_is_tagged_by_target() {
    let cfg: ReportConfig = serde_json::from_str(
        r#"{"target": "CM", "config": {"accountId": "A1", "reportId": "77"}}"#,
    )
    .expect("deserialize cm report config");

    assert_eq!(cfg.platform(), Platform::CampaignManager);
    match cfg {
        ReportConfig::CampaignManager(cm) => {
            assert_eq!(cm.account_id.as_deref(), Some("A1"));
            assert!(cm.profile_id.is_none());
            assert_eq!(cm.report_id, "77");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn every_target_tag_maps_to_its_platform() {
    let cases = [
        (r#"{"target": "DV360", "config": {"queryId": "q"}}"#, Platform::Dv360),
        (r#"{"target": "SA360", "config": {"request": {}}}"#, Platform::Sa360),
        (
            r#"{"target": "ADS", "config": {"developerToken": "t", "customerId": "1"}}"#,
            Platform::GoogleAds,
        ),
        (r#"{"target": "YT", "config": {"target": "channel"}}"#, Platform::YouTube),
    ];
    for (json, platform) in cases {
        let cfg: ReportConfig = serde_json::from_str(json).expect(json);
        assert_eq!(cfg.platform(), platform);
        let back = serde_json::to_value(&cfg).unwrap();
        assert_eq!(back["target"], platform.as_str());
    }
}

#[test]
fn unknown_target_is_rejected() {
    let res: Result<ReportConfig, _> =
        serde_json::from_str(r#"{"target": "GA4", "config": {}}"#);
    assert!(res.is_err());
}
