//! Package builds.
//!
//! A build turns one `(branch, version)` pair into a package file:
//!
//! 1. Recreate the branch's working directory from scratch
//! 2. Copy the branch's recipe template in as `PKGBUILD`
//! 3. Patch `pkgver=` to the new version
//! 4. Refresh the recipe checksums (timed)
//! 5. Run the package build (timed)
//! 6. Locate the produced `*.pkg.tar.zst`
//!
//! # Submodules
//!
//! - [`orchestrator`] - Step sequencing and artifact discovery
//! - [`recipe`] - `PKGBUILD` version patching
//! - [`toolchain`] - The external toolchain capability and its makepkg implementation

pub mod orchestrator;
pub mod recipe;
pub mod toolchain;
mod types;

pub use orchestrator::BuildOrchestrator;
pub use toolchain::{MakepkgToolchain, Toolchain};
pub use types::*;
