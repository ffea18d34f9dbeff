//! Integration tests for App identity loading from key files.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;

use mergebot_github::AppAuth;
use tempfile::TempDir;

const TEST_KEY: &str = include_str!("fixtures/test-key.pem");

#[test]
fn loads_app_identity_from_pem_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let key_path = dir.path().join("app-key.pem");
    fs::write(&key_path, TEST_KEY).expect("failed to write key");

    let auth = AppAuth::from_pem_file(123_456, &key_path).unwrap();

    assert_eq!(auth.app_id(), 123_456);
    assert_eq!(auth.jwt().unwrap().split('.').count(), 3);
}

#[test]
fn unreadable_key_file_fails() {
    assert!(AppAuth::from_pem_file(123_456, "/definitely/not/here.pem").is_err());
}

#[test]
fn non_key_file_fails() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let key_path = dir.path().join("not-a-key.pem");
    fs::write(&key_path, "hello").expect("failed to write file");

    assert!(AppAuth::from_pem_file(123_456, &key_path).is_err());
}
