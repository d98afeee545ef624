//! Command implementations.

mod check;
mod drives;
mod helpers;
mod init;
mod report;
mod run;

pub use check::cmd_check;
pub use drives::{cmd_drives_list, cmd_drives_test};
pub use init::cmd_init;
pub use report::cmd_report;
pub use run::{cmd_analyze, cmd_run, cmd_scan};
