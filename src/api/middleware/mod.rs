//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator — bearer token to `ScopeDescriptor`
//! 2. Audit logger — logs after auth, has the actor id

pub mod audit;
pub mod auth;
