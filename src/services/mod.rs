//! Service layer: outbound transport, identity, aggregation, and
//! orchestration. Handlers stay thin; everything that talks to the
//! backend or sequences multiple calls lives here.

pub mod audit;
pub mod backend;
pub mod identity;
pub mod orchestrator;
pub mod usage;
