//! Unit tests for error types

use svcreg_domain::Error;
use std::error::Error as _;

#[test]
fn test_error_messages() {
    assert_eq!(
        Error::validation("bad name").to_string(),
        "Validation error: bad name"
    );
    assert_eq!(Error::not_found("service 7").to_string(), "Not found: service 7");
    assert!(Error::backend("db down").to_string().contains("db down"));
}

#[test]
fn test_regex_errors_become_validation_errors() {
    let err: Error = regex::Regex::new("(").unwrap_err().into();
    assert!(err.is_validation());
    assert!(err.to_string().contains("invalid pattern"));
}

#[test]
fn test_source_is_preserved() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = Error::io_with_source("writing service file", io);
    assert!(err.source().is_some());
    assert!(!err.is_validation());
}

#[test]
fn test_json_errors_convert() {
    let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: Error = parse.into();
    assert!(matches!(err, Error::Json { .. }));
}
