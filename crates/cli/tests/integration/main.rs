mod common;

mod clean_tests;
mod lock_tests;
mod run_tests;
mod status_tests;
