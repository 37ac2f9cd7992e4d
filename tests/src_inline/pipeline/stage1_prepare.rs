use super::*;

#[test]
fn test_no_payload_uses_example_record() {
    let record = prepare_record(None).unwrap();
    assert_eq!(record, VerificationRecord::example());
}

#[test]
fn test_empty_object_is_valid() {
    let record = prepare_record(Some("{}")).unwrap();
    assert_eq!(record.to_features(), [0.0, 0.0, 2.0, 0.0, 0.0]);
}

#[test]
fn test_malformed_payloads() {
    for payload in ["not json", "[1]", "{\"liveness\": [1]}", ""] {
        match prepare_record(Some(payload)) {
            Err(ScoreError::MalformedInput(_)) => {}
            other => panic!("payload {:?} gave {:?}", payload, other),
        }
    }
}
