mod check;
mod clean;
mod lock;
mod run;
mod status;

pub use check::cmd_check;
pub use clean::cmd_clean;
pub use lock::{cmd_lock, cmd_unlock};
pub use run::cmd_run;
pub use status::cmd_status;
