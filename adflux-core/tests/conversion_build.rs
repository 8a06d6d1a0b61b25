use adflux_core::conversion::{ConversionBuilder, prepare_batch};
use adflux_core::{AdfluxError, BatchConfig, EncryptionInfo, IdType};
use serde_json::json;

fn config(id_type: IdType) -> BatchConfig {
    let encryption_info = id_type.requires_encryption().then(|| EncryptionInfo {
        encryption_entity_id: "e1".into(),
        encryption_entity_type: "DCM_ADVERTISER".into(),
        encryption_source: "AD_SERVING".into(),
    });
    BatchConfig {
        profile_id: "p1".into(),
        id_type,
        conversion: serde_json::from_value(json!({
            "floodlightConfigurationId": "fc",
            "floodlightActivityId": "fa",
            "quantity": 1
        }))
        .unwrap(),
        custom_variables: None,
        encryption_info,
    }
}

#[test]
fn record_fields_override_template_and_defaults() {
    let cfg = config(IdType::Gclid);
    let b = ConversionBuilder::new(&cfg, 1_000);
    let c = b
        .build_line(r#"{"gclid":"G1","quantity":5,"ordinal":"o-1","ignored":"x"}"#)
        .unwrap();

    assert_eq!(c["gclid"], "G1");
    assert_eq!(c["quantity"], 5);
    assert_eq!(c["ordinal"], "o-1");
    assert_eq!(c["timestampMicros"], "1000000");
    assert_eq!(c["floodlightActivityId"], "fa");
    assert!(c.get("ignored").is_none());
    assert!(c.get("customVariables").is_none());
}

#[test]
fn custom_variables_follow_configured_order() {
    let mut cfg = config(IdType::MobileDeviceId);
    cfg.custom_variables = Some(vec!["U2".into(), "U1".into()]);
    let b = ConversionBuilder::new(&cfg, 1);
    let c = b
        .build_line(r#"{"mobileDeviceId":"m","U1":"one","U2":2}"#)
        .unwrap();
    assert_eq!(
        c["customVariables"],
        json!([{"type": "U2", "value": 2}, {"type": "U1", "value": "one"}])
    );
}

#[test]
fn missing_join_key_is_an_invalid_record() {
    let cfg = config(IdType::Gclid);
    let b = ConversionBuilder::new(&cfg, 1);
    let err = b.build_line(r#"{"value": 3}"#).unwrap_err();
    assert_eq!(err, AdfluxError::invalid_record("missing gclid"));
}

#[test]
fn prepare_batch_sets_aside_bad_lines_and_keeps_config() {
    let cfg = config(IdType::Gclid);
    let before = cfg.clone();
    let lines = vec![
        r#"{"gclid":"a"}"#.to_string(),
        "not json".to_string(),
        r#"{"gclid":"c"}"#.to_string(),
    ];
    let p = prepare_batch(&cfg, &lines, 42);
    assert_eq!(p.submitted, vec![0, 2]);
    assert_eq!(p.rejected.len(), 1);
    assert_eq!(p.rejected[0].0, 1);
    assert_eq!(p.request.conversions.len(), 2);
    assert_eq!(
        p.request.conversions[0]["ordinal"],
        p.request.conversions[1]["ordinal"]
    );
    assert_eq!(cfg, before);
}

#[test]
fn encryption_info_travels_only_with_encrypted_ids() {
    let lines = vec![r#"{"encryptedUserId":"enc","gclid":"g"}"#.to_string()];

    let enc = prepare_batch(&config(IdType::EncryptedUserId), &lines, 1);
    let body = serde_json::to_value(&enc.request).unwrap();
    assert_eq!(body["encryptionInfo"]["encryptionEntityId"], "e1");
    assert_eq!(body["conversions"][0]["encryptedUserId"], "enc");

    let plain = prepare_batch(&config(IdType::Gclid), &lines, 1);
    let body = serde_json::to_value(&plain.request).unwrap();
    assert!(body.get("encryptionInfo").is_none());
}
