//! HTTP host: page routes, the login flow and the cookie-backed session plumbing.

pub mod app;
pub mod browser;
pub mod context;
pub mod middleware;
pub mod sessions;
