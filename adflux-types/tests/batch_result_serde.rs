use std::collections::BTreeMap;

use adflux_types::{BatchOutcome, BatchResult, UploadReport};

#[test]
fn success_serializes_without_failure_fields() {
    let json = serde_json::to_value(BatchResult::success(3)).unwrap();
    assert_eq!(json, serde_json::json!({"result": true, "numberOfLines": 3}));
}

#[test]
fn whole_batch_failure_has_single_error_and_no_lines() {
    let r = BatchResult::whole_batch_failure(5, "socket hang up");
    assert!(r.is_whole_batch_failure());
    assert_eq!(r.failed_count(), 5);
    assert_eq!(r.errors(), ["socket hang up".to_string()]);
    let json = serde_json::to_value(&r).unwrap();
    assert!(json.get("failedLines").is_none());
    assert!(json.get("groupedFailed").is_none());
}

#[test]
fn upload_report_folds_batches() {
    let partial = BatchResult {
        result: false,
        number_of_lines: 2,
        failed_lines: Some(vec!["b".into()]),
        grouped_failed: Some(BTreeMap::from([("INVALID_ID".to_string(), vec!["b".to_string()])])),
        errors: Some(vec!["INVALID_ID".into()]),
    };
    let mut report = UploadReport::default();
    report.push(BatchOutcome { batch_id: "1".into(), result: BatchResult::success(4) });
    report.push(BatchOutcome { batch_id: "2".into(), result: partial });
    report.push(BatchOutcome {
        batch_id: "3".into(),
        result: BatchResult::whole_batch_failure(3, "timeout"),
    });

    assert!(!report.is_success());
    assert_eq!(report.total_lines, 9);
    assert_eq!(report.failed_lines, 4);
    assert_eq!(report.errors, vec!["INVALID_ID".to_string(), "timeout".to_string()]);
    assert_eq!(report.grouped_failed["INVALID_ID"], vec!["b".to_string()]);
    let retry: Vec<_> = report.retryable_batches().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(retry, vec!["3"]);
}
