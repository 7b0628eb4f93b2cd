//! Application-wide constants.

use std::time::Duration;

/// Suffix of the package files produced by the build toolchain.
pub const ARTIFACT_SUFFIX: &str = ".pkg.tar.zst";

/// Suffix of detached signatures next to published artifacts.
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Suffix `repo-add` leaves on superseded database files.
pub const STALE_SUFFIX: &str = ".old";

/// Name of the subdirectory of the repository holding superseded artifacts.
pub const ARCHIVE_DIR: &str = "archive";

/// File name of the active recipe inside a working directory.
pub const RECIPE_FILENAME: &str = "PKGBUILD";

/// Limit on a whole HTTP exchange with upstream or a webhook, body included.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
