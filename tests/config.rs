use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use scihub_fetch::config::{ConfigLoader, EnvCredentials};
use scihub_fetch::domain::Credentials;
use scihub_fetch::error::HubError;

#[test]
fn reads_json_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scihub-fetch.json");
    fs::write(
        &path,
        r#"{
            "username": "alice",
            "password": "secret",
            "api_url": "https://mirror.example/dhus",
            "download_dir": "/data/sentinel",
            "data_dirs": ["/archive/2016", "/archive/2017"]
        }"#,
    )
    .unwrap();

    let file = ConfigLoader::read(&path).unwrap();
    let resolved = ConfigLoader::resolve_config(file, EnvCredentials::default()).unwrap();
    assert_eq!(resolved.credentials, Credentials::new("alice", "secret"));
    assert_eq!(resolved.api_url.as_str(), "https://mirror.example/dhus/");
    assert_eq!(resolved.download_dir, Utf8PathBuf::from("/data/sentinel"));
    assert_eq!(
        resolved.data_dirs,
        [
            Utf8PathBuf::from("/archive/2016"),
            Utf8PathBuf::from("/archive/2017")
        ]
    );
}

#[test]
fn explicit_missing_path_is_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, HubError::ConfigRead(_));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ username: alice").unwrap();
    assert_matches!(ConfigLoader::read(&path).unwrap_err(), HubError::ConfigParse(_));
}

#[test]
fn bad_api_url_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    fs::write(
        &path,
        r#"{"username": "a", "password": "b", "api_url": "apihub"}"#,
    )
    .unwrap();
    let file = ConfigLoader::read(&path).unwrap();
    assert_matches!(
        ConfigLoader::resolve_config(file, EnvCredentials::default()).unwrap_err(),
        HubError::InvalidBaseUrl(_)
    );
}
