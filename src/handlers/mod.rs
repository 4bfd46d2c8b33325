//! HTTP handlers. Each handler extracts, delegates to a service, and
//! wraps the result in the uniform response envelope.

pub mod account_handlers;
pub mod auth_handlers;
pub mod container_handlers;
pub mod object_handlers;
pub mod project_handlers;
