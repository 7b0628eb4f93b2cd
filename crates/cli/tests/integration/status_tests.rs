use predicates::prelude::*;
use serde_json::{Value, json};

use super::common::TestEnv;

#[test]
fn status_json_lists_every_branch() {
  let env = TestEnv::new();
  env.write_state(".cache.json", json!({ "stable": "0.0.90" }));
  env.write_state(".artifacts.json", json!({ "stable": "discord-0.0.90-1-x86_64.pkg.tar.zst" }));
  env.write_state(".lockout.json", json!({ "canary": "locked" }));

  let output = env.pkgrelay_cmd().args(["status", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let states: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(
    states,
    json!([
      { "branch": "canary", "version": null, "artifact": null, "status": "locked" },
      { "branch": "ptb", "version": null, "artifact": null, "status": null },
      {
        "branch": "stable",
        "version": "0.0.90",
        "artifact": "discord-0.0.90-1-x86_64.pkg.tar.zst",
        "status": null
      },
    ])
  );
}

#[test]
fn status_text_marks_locked_branches() {
  let env = TestEnv::new();
  env.write_state(".lockout.json", json!({ "ptb": "locked", "stable": "active" }));

  env
    .pkgrelay_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("ptb (locked)"))
    .stdout(predicate::str::contains("stable (locked)").not());
}

#[test]
fn corrupt_state_file_is_reported() {
  let env = TestEnv::new();
  env.write_file("state/.cache.json", "{ not json");

  env
    .pkgrelay_cmd()
    .arg("status")
    .assert()
    .failure()
    .stderr(predicate::str::contains(".cache.json"));
}

#[test]
fn status_reports_busy_state_but_still_prints() {
  use pkgrelay_lib::state_lock::{LockMode, StateLock};

  let env = TestEnv::new();
  let _held = StateLock::acquire(&env.path("state"), LockMode::Exclusive, "check ptb").unwrap();

  env
    .pkgrelay_cmd()
    .arg("status")
    .assert()
    .success()
    .stderr(predicate::str::contains("State is being updated by 'check ptb'"))
    .stdout(predicate::str::contains("canary"));
}

#[test]
fn boolean_lockout_file_is_understood() {
  let env = TestEnv::new();
  env.write_state(".lockout.json", json!({ "canary": true, "stable": false }));

  env
    .pkgrelay_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("canary (locked)"))
    .stdout(predicate::str::contains("stable (locked)").not());
}
