//! Shared, read-only inputs for every strategy call.

use crate::config::RunConfig;
use crate::gateway::GatewayClient;
use medqa_domain::SpecialtyCatalog;
use std::sync::Arc;

/// Gateway, catalog and configuration for one run.
///
/// Cheap to clone; nothing in it is mutated while questions run.
#[derive(Clone)]
pub struct StrategyContext {
    pub gateway: GatewayClient,
    pub catalog: Arc<SpecialtyCatalog>,
    pub config: Arc<RunConfig>,
}

impl StrategyContext {
    pub fn new(gateway: GatewayClient, catalog: Arc<SpecialtyCatalog>, config: Arc<RunConfig>) -> Self {
        Self {
            gateway,
            catalog,
            config,
        }
    }
}
