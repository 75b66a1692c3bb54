pub mod limits {

    pub const DEFAULT_LOG_LIMIT: u64 = 50;

    pub const MAX_LOG_LIMIT: u64 = 1000;

    pub const MAX_QUERY_LENGTH: usize = 256;
}

pub mod jobs {

    pub const MIN_INTERVAL_MINUTES: i32 = 1;

    /// One week.
    pub const MAX_INTERVAL_MINUTES: i32 = 7 * 24 * 60;
}
