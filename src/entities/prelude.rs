pub use super::scheduled_jobs::Entity as ScheduledJobs;
pub use super::search_logs::Entity as SearchLogs;
