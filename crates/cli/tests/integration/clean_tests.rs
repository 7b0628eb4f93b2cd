use predicates::prelude::*;
use serde_json::json;

use super::common::TestEnv;

#[test]
fn clean_removes_workdir_and_version_cache() {
  let env = TestEnv::new();
  env.write_file("work/canary/PKGBUILD", "pkgver=1\n");
  env.write_state(".cache.json", json!({ "canary": "1", "stable": "2" }));
  env.write_state(".artifacts.json", json!({ "canary": "c-1-1-x86_64.pkg.tar.zst" }));
  env.write_state(".lockout.json", json!({ "ptb": "locked" }));

  env
    .pkgrelay_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cleaned working state"));

  assert!(!env.path("work").exists());
  assert!(env.read_state(".cache.json").is_null());
  assert_eq!(
    env.read_state(".artifacts.json"),
    json!({ "canary": "c-1-1-x86_64.pkg.tar.zst" })
  );
  assert_eq!(env.read_state(".lockout.json"), json!({ "ptb": "locked" }));
}

#[test]
fn clean_with_nothing_to_do() {
  let env = TestEnv::new();

  env
    .pkgrelay_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}
