pub mod jobs;
pub mod search_logs;
