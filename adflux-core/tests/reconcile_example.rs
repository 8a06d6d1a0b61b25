use std::collections::BTreeMap;

use adflux_core::{RecordError, RecordStatus, reconcile};

fn lines() -> Vec<String> {
    vec![r#"{"gclid":"a"}"#.to_string(), r#"{"gclid":"b"}"#.to_string()]
}

#[test]
fn second_line_with_two_errors() {
    let statuses = vec![
        RecordStatus::default(),
        RecordStatus {
            errors: vec![
                RecordError::new("400 error: INVALID_ID"),
                RecordError::new("400 error: MISSING_FIELD"),
            ],
        },
    ];
    let r = reconcile(&lines(), &statuses);
    let line2 = lines()[1].clone();

    assert!(!r.result);
    assert_eq!(r.number_of_lines, 2);
    assert_eq!(r.failed_lines, Some(vec![line2.clone()]));
    assert_eq!(
        r.grouped_failed,
        Some(BTreeMap::from([
            ("INVALID_ID".to_string(), vec![line2.clone()]),
            ("MISSING_FIELD".to_string(), vec![line2]),
        ]))
    );
    assert_eq!(
        r.errors,
        Some(vec!["INVALID_ID".to_string(), "MISSING_FIELD".to_string()])
    );
}

#[test]
fn same_class_on_two_lines_groups_both() {
    let statuses = vec![
        RecordStatus { errors: vec![RecordError::new("conv 1 error: NOT_FOUND")] },
        RecordStatus { errors: vec![RecordError::new("conv 2 error: NOT_FOUND")] },
    ];
    let r = reconcile(&lines(), &statuses);
    assert_eq!(r.errors, Some(vec!["NOT_FOUND".to_string()]));
    assert_eq!(r.grouped_failed.unwrap()["NOT_FOUND"], lines());
}

#[test]
fn status_without_errors_is_success() {
    let r = reconcile(&lines(), &[RecordStatus::default(), RecordStatus::default()]);
    assert_eq!(r, adflux_core::BatchResult::success(2));
}

#[test]
fn status_index_beyond_lines_is_ignored() {
    let statuses = vec![
        RecordStatus::default(),
        RecordStatus::default(),
        RecordStatus { errors: vec![RecordError::new("stray")] },
    ];
    let r = reconcile(&lines(), &statuses);
    assert!(r.result);
}

#[test]
fn status_deserializes_from_platform_shape() {
    let statuses: Vec<RecordStatus> = serde_json::from_value(serde_json::json!([
        {"kind": "dfareporting#conversionStatus"},
        {"errors": [{"code": "INVALID_ARGUMENT", "message": "x error: BAD", "kind": "k"}]}
    ]))
    .unwrap();
    assert!(statuses[0].errors.is_empty());
    assert_eq!(statuses[1].errors[0].code.as_deref(), Some("INVALID_ARGUMENT"));
}
