//! Configuration file loading for medqa-bench
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. CLI flags (applied by the binary)
//! 2. `MEDQA_*` environment variables
//! 3. `--config <path>` specified file
//! 4. Project root: `./medqa.toml` or `./.medqa.toml`
//! 5. XDG config: `$XDG_CONFIG_HOME/medqa-bench/config.toml`
//! 6. Default values

mod file_config;
mod loader;
mod validation;

pub use file_config::{
    FileBackendConfig, FileConfig, FileDebateConfig, FileGraphConfig, FileMajorityConfig,
    FileOutputConfig, FileParallelConfig, FilePlannerConfig, FileProgressiveConfig, FileRunConfig,
    PROVIDERS,
};
pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
