mod check;
mod jobs;
mod logs;

pub use check::cmd_check;
pub use jobs::{cmd_jobs_add, cmd_jobs_list, cmd_jobs_remove, cmd_jobs_set_active};
pub use logs::cmd_logs;
