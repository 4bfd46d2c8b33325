//! Shared application state handed to every handler.

use crate::services::{
    backend::BackendClient, identity::IdentityService, orchestrator::ResourceOrchestrator,
    usage::UsageAggregator,
};

/// Cheap to clone; every member wraps the one shared `reqwest::Client`.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub backend: BackendClient,
    pub usage: UsageAggregator,
    pub orchestrator: ResourceOrchestrator,
}
