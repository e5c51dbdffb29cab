//! Application-level configuration.
//!
//! - [`RunConfig`]: per-call limits, retry policy and strategy knobs

pub mod run_config;

pub use run_config::RunConfig;
