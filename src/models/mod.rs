pub mod check;
pub mod job;
pub mod search_log;
