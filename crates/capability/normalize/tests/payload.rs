use qdb_normalize::{
    FieldError, MAX_TS_MS, MetricErrorPolicy, NormalizeError, parse_payload,
};

fn parse(body: &str) -> Result<qdb_normalize::ParsedPayload, NormalizeError> {
    parse_payload(body.as_bytes(), MetricErrorPolicy::Reject)
}

#[test]
fn parses_complete_metric() {
    let parsed = parse(
        r#"{"metrics":[{"name":"temp","alias":3,"value":21.7,"timestamp":1700000000}]}"#,
    )
    .expect("parsed");
    assert_eq!(parsed.records.len(), 1);
    let record = &parsed.records[0];
    assert_eq!(record.name.as_deref(), Some("temp"));
    assert_eq!(record.alias, Some(3));
    assert_eq!(record.value, Some(21.7));
    assert_eq!(record.ts_ms, 1_700_000_000_000);
    assert!(parsed.skipped.is_empty());
}

#[test]
fn missing_metrics_field_yields_empty_list() {
    let parsed = parse(r#"{"seq":4,"timestamp":1700000000}"#).expect("parsed");
    assert!(parsed.records.is_empty());
}

#[test]
fn timestamp_seconds_scale_exactly() {
    for secs in [0_i64, 1, 1_700_000_000, 4_102_444_800, -86_400] {
        let body = format!(r#"{{"metrics":[{{"timestamp":{secs}}}]}}"#);
        let parsed = parse(&body).expect("parsed");
        assert_eq!(parsed.records[0].ts_ms, secs * 1000);
    }
}

#[test]
fn fractional_timestamp_rounds_to_millis() {
    let parsed = parse(r#"{"metrics":[{"timestamp":1700000000.25}]}"#).expect("parsed");
    assert_eq!(parsed.records[0].ts_ms, 1_700_000_000_250);
}

#[test]
fn absent_value_is_null_and_string_value_is_coerced() {
    let parsed = parse(
        r#"{"metrics":[
            {"name":"a","timestamp":1},
            {"name":"b","value":"12.5","timestamp":1},
            {"name":"c","value":null,"timestamp":1},
            {"name":"d","value":true,"timestamp":1}
        ]}"#,
    )
    .expect("parsed");
    let values: Vec<_> = parsed.records.iter().map(|record| record.value).collect();
    assert_eq!(values, vec![None, Some(12.5), None, Some(1.0)]);
}

#[test]
fn name_and_alias_are_optional() {
    let parsed = parse(r#"{"metrics":[{"value":1,"timestamp":2}]}"#).expect("parsed");
    assert!(parsed.records[0].name.is_none());
    assert!(parsed.records[0].alias.is_none());
}

#[test]
fn malformed_body_rejects_whole_message() {
    assert!(matches!(
        parse("not json"),
        Err(NormalizeError::InvalidPayload(_))
    ));
    assert!(matches!(
        parse_payload(&[0xff, 0xfe], MetricErrorPolicy::Reject),
        Err(NormalizeError::InvalidPayload(_))
    ));
    assert!(matches!(
        parse(r#"[{"timestamp":1}]"#),
        Err(NormalizeError::InvalidPayload(_))
    ));
    assert!(matches!(
        parse(r#"{"metrics":{"timestamp":1}}"#),
        Err(NormalizeError::InvalidPayload(_))
    ));
    assert!(matches!(
        parse(r#"{"metrics":null}"#),
        Err(NormalizeError::InvalidPayload(_))
    ));
}

#[test]
fn missing_timestamp_is_metric_error() {
    let err = parse(r#"{"metrics":[{"name":"a","value":1}]}"#).expect_err("rejected");
    let NormalizeError::InvalidMetric(err) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(err.index, 0);
    assert_eq!(err.field, "timestamp");
    assert_eq!(err.reason, FieldError::Missing);
}

#[test]
fn timestamp_must_fit_store_microseconds() {
    let max_secs = MAX_TS_MS / 1000;
    let parsed = parse(&format!(r#"{{"metrics":[{{"timestamp":{max_secs}}}]}}"#)).expect("parsed");
    assert_eq!(parsed.records[0].ts_ms, max_secs * 1000);

    for secs in ["9300000000000", "-9300000000000", "9300000000000.5"] {
        let body = format!(r#"{{"metrics":[{{"timestamp":{secs}}}]}}"#);
        let Err(NormalizeError::InvalidMetric(err)) = parse(&body) else {
            panic!("{secs}: accepted");
        };
        assert_eq!(err.field, "timestamp");
        assert_eq!(err.reason, FieldError::OutOfRange);
    }
}

#[test]
fn non_numeric_fields_are_metric_errors() {
    let cases = [
        (r#"{"timestamp":"soon"}"#, "timestamp"),
        (r#"{"timestamp":1,"value":"warm"}"#, "value"),
        (r#"{"timestamp":1,"value":[1]}"#, "value"),
        (r#"{"timestamp":1,"alias":"x"}"#, "alias"),
        (r#"{"timestamp":1,"alias":1.5}"#, "alias"),
        (r#"{"timestamp":1,"alias":4294967296}"#, "alias"),
        (r#"{"timestamp":1,"name":5}"#, "name"),
        (r#"{"timestamp":9223372036854775807}"#, "timestamp"),
    ];
    for (metric, field) in cases {
        let body = format!(r#"{{"metrics":[{metric}]}}"#);
        match parse(&body) {
            Err(NormalizeError::InvalidMetric(err)) => assert_eq!(err.field, field, "{metric}"),
            other => panic!("{metric}: unexpected {other:?}"),
        }
    }
}

#[test]
fn reject_policy_drops_valid_siblings() {
    let body = r#"{"metrics":[
        {"name":"ok","value":1,"timestamp":1},
        {"name":"bad","value":"warm","timestamp":1}
    ]}"#;
    let err = parse(body).expect_err("rejected");
    assert!(matches!(err, NormalizeError::InvalidMetric(ref e) if e.index == 1));
}

#[test]
fn skip_policy_keeps_valid_siblings() {
    let body = r#"{"metrics":[
        {"name":"ok","value":1,"timestamp":1},
        {"name":"bad","value":"warm","timestamp":1},
        "garbage",
        {"name":"ok2","timestamp":2}
    ]}"#;
    let parsed = parse_payload(body.as_bytes(), MetricErrorPolicy::Skip).expect("parsed");
    let names: Vec<_> = parsed
        .records
        .iter()
        .map(|record| record.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["ok", "ok2"]);
    assert_eq!(parsed.skipped.len(), 2);
    assert_eq!(parsed.skipped[0].index, 1);
    assert_eq!(parsed.skipped[1].field, "metric");
}

#[test]
fn skip_policy_still_rejects_malformed_body() {
    let err = parse_payload(b"{", MetricErrorPolicy::Skip).expect_err("rejected");
    assert!(matches!(err, NormalizeError::InvalidPayload(_)));
}
