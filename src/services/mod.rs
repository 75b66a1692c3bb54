pub mod attempts;
pub use attempts::{Attempt, AttemptKind, LocationRules, build_attempts};

pub mod ad_check;
pub use ad_check::{AdCheckService, AdCheckSettings, CheckError, SearchBackend};

pub mod notifier;
pub use notifier::{Notifier, format_alert};

pub mod job_runner;
pub use job_runner::{JobError, JobRunner, RunStats, RunnerSettings};

pub mod preferences;
pub use preferences::{Preference, PreferenceStore};

pub mod scheduler;
pub use scheduler::Scheduler;
