pub mod serpapi;
pub mod telegram;
