use predicates::prelude::*;
use serde_json::json;

use super::common::TestEnv;

#[test]
fn run_with_unreachable_upstream_succeeds() {
  let env = TestEnv::new();

  env
    .pkgrelay_cmd()
    .arg("run")
    .assert()
    .success()
    .stderr(predicate::str::contains("canary: upstream unavailable"))
    .stdout(predicate::str::contains("Published: 0"));

  assert!(env.read_state(".cache.json").is_null());
}

#[test]
fn locked_branch_is_skipped_by_check() {
  let env = TestEnv::new();
  env.write_state(".lockout.json", json!({ "stable": "locked" }));

  env
    .pkgrelay_cmd()
    .args(["check", "stable"])
    .assert()
    .success()
    .stdout(predicate::str::contains("stable: locked, skipped"));
}

#[cfg(unix)]
mod end_to_end {
  use std::os::unix::fs::PermissionsExt;

  use mockito::Matcher;

  use super::*;

  const RECIPE: &str = "pkgname=discord-canary\npkgver=0.0.1\npkgrel=1\n";

  /// Environment with a mocked upstream, stub toolchain commands and a stub `repo-add` on PATH.
  fn pipeline_env(server: &mockito::ServerGuard, build_command: &str) -> TestEnv {
    let env = TestEnv::with_config(json!({
      "version_endpoint": format!("{}/api/updates", server.url()),
      "checksum_command": "true",
      "build_command": build_command,
    }));
    env.write_file("pkgbuilds/PKGBUILD.canary", RECIPE);

    let repo_add = env.write_file(
      "bin/repo-add",
      "#!/bin/sh\necho \"$@\" >> repo-add.log\ntouch \"$1\"\n",
    );
    std::fs::set_permissions(&repo_add, std::fs::Permissions::from_mode(0o755)).unwrap();
    env
  }

  fn path_with_stubs(env: &TestEnv) -> String {
    format!(
      "{}:{}",
      env.path("bin").display(),
      std::env::var("PATH").unwrap_or_default()
    )
  }

  #[test]
  fn check_builds_and_publishes_new_version() {
    let mut server = mockito::Server::new();
    let upstream = server
      .mock("GET", "/api/updates/canary")
      .match_query(Matcher::UrlEncoded("platform".into(), "linux".into()))
      .with_status(200)
      .with_body(r#"{"name": "0.0.99"}"#)
      .create();
    let env = pipeline_env(
      &server,
      ". ./PKGBUILD && touch \"$pkgname-$pkgver-$pkgrel-x86_64.pkg.tar.zst\"",
    );

    env
      .pkgrelay_cmd()
      .env("PATH", path_with_stubs(&env))
      .args(["check", "canary"])
      .assert()
      .success()
      .stdout(predicate::str::contains("canary: published 0.0.99"));

    upstream.assert();
    let artifact = "discord-canary-0.0.99-1-x86_64.pkg.tar.zst";
    assert!(env.path("repo").join(artifact).is_file());
    assert!(env.path("repo/discord.db.tar.gz").is_file());
    let log = std::fs::read_to_string(env.path("repo/repo-add.log")).unwrap();
    assert_eq!(log.trim(), format!("discord.db.tar.gz {}", artifact));

    assert_eq!(env.read_state(".cache.json"), json!({ "canary": "0.0.99" }));
    assert_eq!(env.read_state(".artifacts.json"), json!({ "canary": artifact }));
  }

  #[test]
  fn failed_build_locks_branch_and_exits_non_zero() {
    let mut server = mockito::Server::new();
    server
      .mock("GET", "/api/updates/canary")
      .match_query(Matcher::Any)
      .with_body(r#"{"name": "0.0.100"}"#)
      .create();
    let env = pipeline_env(&server, "exit 1");
    env.write_state(".cache.json", json!({ "canary": "0.0.99" }));

    env
      .pkgrelay_cmd()
      .env("PATH", path_with_stubs(&env))
      .args(["check", "canary"])
      .assert()
      .failure()
      .stderr(predicate::str::contains("Build of canary 0.0.100 failed"));

    assert_eq!(env.read_state(".lockout.json"), json!({ "canary": "locked" }));
    assert_eq!(env.read_state(".cache.json"), json!({ "canary": "0.0.99" }));
    assert!(!env.path("repo").exists());
  }
}
