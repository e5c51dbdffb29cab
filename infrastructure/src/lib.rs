//! Infrastructure layer for medqa-bench
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP inference backends, configuration file
//! loading, dataset parsing, checkpoint persistence and run-event logging.

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use checkpoint::JsonCheckpointStore;
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, FileBackendConfig, FileConfig, FileOutputConfig,
    PROVIDERS, Severity,
};
pub use dataset::{DatasetError, LoadedDataset, load_dataset};
pub use logging::JsonlRunEventLogger;
pub use providers::{OllamaGateway, OpenAiCompatGateway, ProviderKind, build_gateway};
