//! pkgrelay-lib: release pipeline for repackaged Discord builds
//!
//! This crate tracks the upstream release channels and turns each new version
//! into a signed package in a pacman repository:
//! - `source`: asks upstream for the current version of a branch
//! - `build`: runs the package toolchain in a fresh working directory
//! - `repo`: publishes, archives and prunes repository files
//! - `state`: the persistent version, artifact and lockout records
//! - `pipeline`: sequences all of the above, one branch at a time

pub mod branch;
pub mod build;
pub mod config;
pub mod consts;
pub mod execute;
pub mod notify;
pub mod pipeline;
pub mod repo;
pub mod source;
pub mod state;
pub mod state_lock;
pub mod util;
