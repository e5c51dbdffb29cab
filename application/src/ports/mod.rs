//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod checkpoint_store;
pub mod llm_gateway;
pub mod progress;
pub mod run_event_logger;
