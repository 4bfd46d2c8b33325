//! Core data models for the storage gateway.
//!
//! Every entity here is a request-scoped value object: created while a
//! request is being handled, serialized into the response, and dropped.
//! Nothing in this module is shared across requests.

pub mod activity;
pub mod container;
pub mod context;
pub mod object;
pub mod response;
pub mod usage;
