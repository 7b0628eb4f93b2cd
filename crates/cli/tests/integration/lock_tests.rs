use predicates::prelude::*;
use serde_json::json;

use pkgrelay_lib::state_lock::{LockMode, StateLock};

use super::common::TestEnv;

#[test]
fn lock_marks_branch_locked() {
  let env = TestEnv::new();

  env
    .pkgrelay_cmd()
    .args(["lock", "canary"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Locked canary"));

  assert_eq!(env.read_state(".lockout.json"), json!({ "canary": "locked" }));
}

#[test]
fn unlock_after_lock_writes_active() {
  let env = TestEnv::new();

  env.pkgrelay_cmd().args(["lock", "ptb"]).assert().success();
  env
    .pkgrelay_cmd()
    .args(["unlock", "ptb"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Unlocked ptb"));

  assert_eq!(env.read_state(".lockout.json"), json!({ "ptb": "active" }));
}

#[test]
fn unlock_of_unlocked_branch_fails() {
  let env = TestEnv::new();

  env
    .pkgrelay_cmd()
    .args(["unlock", "stable"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("branch stable is not locked"));

  assert!(env.read_state(".lockout.json").is_null());
}

#[test]
fn held_state_lock_blocks_mutation() {
  let env = TestEnv::new();
  let _held = StateLock::acquire(&env.path("state"), LockMode::Exclusive, "run --daemon").unwrap();

  env
    .pkgrelay_cmd()
    .args(["lock", "canary"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("run --daemon"));

  assert!(env.read_state(".lockout.json").is_null());
}
