//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token → `SessionUser`
//! 2. Audit logger: logs after auth, has user_id

pub mod audit;
pub mod auth;
