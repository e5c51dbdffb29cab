//! Application layer for medqa-bench
//!
//! This crate contains the strategies, the benchmark runner, port
//! definitions and run configuration. It depends only on the domain layer.

pub mod config;
pub mod gateway;
pub mod ports;
pub mod strategies;
pub mod use_cases;

// Re-export commonly used types
pub use config::RunConfig;
pub use gateway::GatewayClient;
pub use ports::{
    checkpoint_store::{CheckpointError, CheckpointStore, NoCheckpoint},
    llm_gateway::{Completion, CompletionRequest, GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
    run_event_logger::{NoEventLogger, RunEvent, RunEventLogger},
};
pub use strategies::{Strategy, StrategyContext, answer_question, build_strategy};
pub use use_cases::run_benchmark::{
    RunBenchmarkError, RunBenchmarkInput, RunBenchmarkOutput, RunBenchmarkUseCase,
};
