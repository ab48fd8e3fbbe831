//! HTTP API layer: router, middleware stack, endpoint handlers, and the
//! WebSocket stock feed.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod stock_feed;
pub mod types;
