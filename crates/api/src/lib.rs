//! HTTP API: routing, auth middleware, request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
