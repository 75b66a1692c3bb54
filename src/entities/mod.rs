pub mod prelude;

pub mod scheduled_jobs;
pub mod search_logs;
