use super::*;

#[test]
fn usage_serializes_to_json() {
    let usage = UserUsage {
        user_id: "u1".to_string(),
        request_count: 3,
        last_request_at: chrono::NaiveDate::from_ymd_opt(2024, 10, 31)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp"),
    };

    let json = serde_json::to_value(&usage).expect("should serialize");
    assert_eq!(json["user_id"], "u1");
    assert_eq!(json["request_count"], 3);
    assert_eq!(json["last_request_at"], "2024-10-31T12:00:00");
}
