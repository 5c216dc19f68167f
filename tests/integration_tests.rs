//! Integration tests for the factory-scope CLI.
//!
//! Everything here runs offline: commands that would touch the backend
//! are only exercised through their failure paths (unconfigured backend,
//! unreachable host), and state always lives in a temp directory.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a factory-scope Command with isolated state.
fn scope_cmd(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("factory-scope");
    // Point config at a nonexistent file so the user's real config and
    // environment never leak into the tests.
    cmd.arg("--config")
        .arg(state.path().join("no-such-config.toml"))
        .arg("--state-dir")
        .arg(state.path().join("state"))
        .env_remove("FACTORY_SCOPE_BACKEND_URL")
        .env_remove("FACTORY_SCOPE_API_KEY")
        .env_remove("FACTORY_SCOPE_STATE_DIR");
    cmd
}

mod cli_basics {
    use super::*;

    #[test]
    fn help_succeeds() {
        cargo_bin_cmd!("factory-scope")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("factory scope"));
    }

    #[test]
    fn version_succeeds() {
        cargo_bin_cmd!("factory-scope")
            .arg("--version")
            .assert()
            .success();
    }
}

mod offline_state {
    use super::*;

    #[test]
    fn status_without_session_reports_signed_out() {
        let state = TempDir::new().unwrap();
        scope_cmd(&state)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not signed in"));
    }

    #[test]
    fn reset_on_clean_state_succeeds() {
        let state = TempDir::new().unwrap();
        scope_cmd(&state)
            .arg("reset")
            .assert()
            .success()
            .stdout(predicate::str::contains("Signed out"));
    }

    #[test]
    fn observe_without_session_is_rejected() {
        let state = TempDir::new().unwrap();
        scope_cmd(&state)
            .args(["observe", "ALT"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not signed in"));
    }
}

mod backend_config {
    use super::*;

    /// Like `scope_cmd`, but with a config file pointing at a port
    /// nothing listens on.
    fn unreachable_backend_cmd(state: &TempDir) -> Command {
        let config_path = state.path().join("factory-scope.toml");
        std::fs::write(
            &config_path,
            "backend_url = \"http://127.0.0.1:1\"\napi_key = \"k\"\n",
        )
        .unwrap();

        let mut cmd = cargo_bin_cmd!("factory-scope");
        cmd.arg("--config")
            .arg(config_path)
            .arg("--state-dir")
            .arg(state.path().join("state"))
            .env_remove("FACTORY_SCOPE_BACKEND_URL")
            .env_remove("FACTORY_SCOPE_API_KEY")
            .env_remove("FACTORY_SCOPE_STATE_DIR");
        cmd
    }

    #[test]
    fn login_without_backend_url_fails_with_guidance() {
        let state = TempDir::new().unwrap();
        scope_cmd(&state)
            .args(["login", "--user", "u-1", "--role", "user"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("backend_url is not configured"));
    }

    #[test]
    fn login_with_invalid_role_is_rejected() {
        let state = TempDir::new().unwrap();
        scope_cmd(&state)
            .args(["login", "--user", "u-1", "--role", "superuser"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid role"));
    }

    #[test]
    fn factories_with_unreachable_backend_reports_source_error() {
        let state = TempDir::new().unwrap();
        unreachable_backend_cmd(&state)
            .arg("factories")
            .assert()
            .failure()
            .stderr(predicate::str::contains("factory backend"));
    }

    #[test]
    fn failed_login_leaves_no_session_behind() {
        let state = TempDir::new().unwrap();
        unreachable_backend_cmd(&state)
            .args(["login", "--user", "u-1", "--role", "user"])
            .assert()
            .failure();

        // The fails-closed contract extends to the CLI: no half-written
        // session after a failed load.
        assert!(!state.path().join("state").join("session.json").exists());

        unreachable_backend_cmd(&state)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Not signed in"));
    }
}
