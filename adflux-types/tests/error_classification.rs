use adflux_types::AdfluxError;

#[test]
fn both_profile_resolution_outcomes_are_terminal() {
    let none = AdfluxError::not_found("profile of current user for account A1");
    let many = AdfluxError::AmbiguousProfile {
        account_id: "A1".into(),
        count: 2,
    };
    assert!(none.is_terminal());
    assert!(many.is_terminal());
}

#[test]
fn unsupported_status_is_terminal_but_not_a_configuration_fault() {
    let e = AdfluxError::unsupported_status("CM", "EXPIRED");
    assert!(e.is_terminal());
    assert!(!e.is_configuration());
}

#[test]
fn transport_and_data_errors_stay_retryable() {
    assert!(!AdfluxError::transport("DV360", "status 503").is_terminal());
    assert!(!AdfluxError::Data("no report id".into()).is_terminal());
    assert!(!AdfluxError::request_timeout("report").is_terminal());
}
