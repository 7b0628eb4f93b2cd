//! Package repository maintenance.
//!
//! # Repository Layout
//!
//! ```text
//! {repo_location}/
//! ├── <name>.pkg.tar.zst            # current artifacts
//! ├── <name>.pkg.tar.zst.sig        # detached signatures (when signing)
//! ├── <repo_name>.db.tar.gz         # database maintained by repo-add
//! └── archive/
//!     └── <name>.pkg.tar.zst/       # one directory per superseded artifact
//!         ├── <name>.pkg.tar.zst
//!         └── <name>.pkg.tar.zst.sig
//! ```

pub mod publisher;
pub mod tools;
mod types;

pub use publisher::RepoPublisher;
pub use tools::{GpgRepoTools, RepoTools};
pub use types::PublishError;
