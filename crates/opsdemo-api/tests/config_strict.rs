#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use opsdemo_api::config::{self, LogFormat};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:8000"
metrics:
  latency_bucketz: [0.1, 1.0] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8000");
    assert_eq!(cfg.server.request_id_header, "x-request-id");
    assert_eq!(cfg.metrics.latency_buckets.first(), Some(&0.005));
    assert_eq!(cfg.metrics.latency_buckets.last(), Some(&5.0));
    assert_eq!(cfg.metrics.max_series, 10_000);
    assert_eq!(cfg.logging.format, LogFormat::Text);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
  request_id_header: "X-Correlation-Id"
metrics:
  latency_buckets: [0.001, 0.01, 0.1]
  max_series: 50
logging:
  filter: "opsdemo_api=debug"
  format: json
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9000);
    assert_eq!(
        cfg.server.request_id_header_name().unwrap().as_str(),
        "x-correlation-id"
    );
    assert_eq!(cfg.metrics.latency_buckets, vec![0.001, 0.01, 0.1]);
    assert_eq!(cfg.metrics.max_series, 50);
    assert_eq!(cfg.logging.format, LogFormat::Json);
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn bucket_bounds_are_validated() {
    for buckets in ["[]", "[0.5, 0.1]", "[0.1, 0.1]", "[0.0, 1.0]", "[-0.1, 1.0]"] {
        let s = format!("version: 1\nmetrics:\n  latency_buckets: {buckets}\n");
        let err = config::load_from_str(&s).expect_err(&s);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{buckets}");
    }
}

#[test]
fn bad_listen_and_header_are_rejected() {
    let bad_listen = "version: 1\nserver:\n  listen: \"not-an-addr\"\n";
    assert!(config::load_from_str(bad_listen).is_err());

    let bad_header = "version: 1\nserver:\n  request_id_header: \"x request id\"\n";
    assert!(config::load_from_str(bad_header).is_err());

    let zero_series = "version: 1\nmetrics:\n  max_series: 0\n";
    assert!(config::load_from_str(zero_series).is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("/nonexistent/opsdemo.yaml").expect("defaults");
    assert_eq!(cfg.version, 1);
    assert!(config::load_from_file("/nonexistent/opsdemo.yaml").is_err());
}
