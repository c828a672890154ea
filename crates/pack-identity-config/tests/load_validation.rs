//! Config load validation tests for pack-identity-config.
// crates/pack-identity-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, sections).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test inspects redacted debug output.")]

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use pack_identity_config::AuditSinkKind;
use pack_identity_config::ConfigError;
use pack_identity_config::PackIdentityConfig;
use pack_identity_config::RevocationMode;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<PackIdentityConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(PackIdentityConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        PackIdentityConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(PackIdentityConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(PackIdentityConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config("[verification]\ntimeout = 5\n")?;
    assert_invalid(PackIdentityConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let config = PackIdentityConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != PackIdentityConfig::default() {
        return Err("empty config should equal defaults".to_string());
    }
    if config.verification.timeout() != Duration::from_millis(2_000) {
        return Err("default timeout should be 2000ms".to_string());
    }
    if !config.duplicates.policy().zero_is_unset {
        return Err("zero identifiers should be exempt by default".to_string());
    }
    Ok(())
}

#[test]
fn full_config_round_trips_sections() -> TestResult {
    let file = write_config(
        r#"
[verification]
timeout_ms = 250

[revocation]
mode = "http"
base_url = "https://allocations.example.com"
auth_token = "secret"
request_timeout_ms = 200

[duplicates]
zero_is_unset = false

[audit]
sink = "file"
path = "audit/pack-identity.jsonl"
"#,
    )?;
    let config = PackIdentityConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.verification.timeout_ms != 250 {
        return Err("timeout_ms not applied".to_string());
    }
    if config.revocation.mode != RevocationMode::Http || config.revocation.request_timeout_ms != 200 {
        return Err("revocation section not applied".to_string());
    }
    if config.duplicates.policy().zero_is_unset {
        return Err("zero_is_unset not applied".to_string());
    }
    if config.audit.sink != AuditSinkKind::File {
        return Err("audit sink not applied".to_string());
    }
    if format!("{:?}", config.revocation).contains("secret") {
        return Err("auth token leaked through debug output".to_string());
    }
    Ok(())
}

#[test]
fn verification_timeout_is_bounded() -> TestResult {
    assert_invalid(
        PackIdentityConfig::from_toml_str("[verification]\ntimeout_ms = 5\n"),
        "verification.timeout_ms must be between",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str("[verification]\ntimeout_ms = 60001\n"),
        "verification.timeout_ms must be between",
    )
}

#[test]
fn http_revocation_requires_secure_base_url() -> TestResult {
    assert_invalid(
        PackIdentityConfig::from_toml_str("[revocation]\nmode = \"http\"\n"),
        "requires revocation.base_url",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str(
            "[revocation]\nmode = \"http\"\nbase_url = \"http://127.0.0.1:8080\"\n",
        ),
        "without allow_insecure_http",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str(
            "[revocation]\nmode = \"http\"\nbase_url = \"allocations.example.com\"\n",
        ),
        "must include http:// or https://",
    )?;
    PackIdentityConfig::from_toml_str(
        "[revocation]\nmode = \"http\"\nbase_url = \"http://127.0.0.1:8080\"\nallow_insecure_http = true\n",
    )
    .map(|_| ())
    .map_err(|err| err.to_string())
}

#[test]
fn revocation_settings_are_checked() -> TestResult {
    assert_invalid(
        PackIdentityConfig::from_toml_str("[revocation]\nbase_url = \"https://a.example\"\n"),
        "only allowed when mode=http",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str(
            "[revocation]\nmode = \"http\"\nbase_url = \"https://a.example\"\nauth_token = \" \"\n",
        ),
        "auth_token must be non-empty",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str(
            "[revocation]\nmode = \"http\"\nbase_url = \"https://a.example\"\nconnect_timeout_ms = 0\n",
        ),
        "connect_timeout_ms must be between",
    )
}

#[test]
fn audit_file_sink_requires_path() -> TestResult {
    assert_invalid(
        PackIdentityConfig::from_toml_str("[audit]\nsink = \"file\"\n"),
        "requires audit.path",
    )?;
    assert_invalid(
        PackIdentityConfig::from_toml_str("[audit]\nsink = \"stderr\"\npath = \"a.log\"\n"),
        "only allowed when sink=file",
    )
}
