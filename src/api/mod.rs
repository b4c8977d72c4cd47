//! HTTP API for the portal.
//!
//! Routes are nested under `/api/`. Protected routes run behind
//! Auth → Audit → Handler; `/api/health` is open.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::portal_router;
pub use server::{start_server, PortalServer};
pub use types::ApiContext;
