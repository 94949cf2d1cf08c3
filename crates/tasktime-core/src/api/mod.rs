//! REST API client module for the task service.
//!
//! Outbound calls pass through the `CachingClient` interceptor pipeline,
//! which sits on top of a pluggable `Transport` (reqwest in production).
//! `TaskService` exposes the operations the UI layer uses.

pub mod client;
pub mod error;
pub mod request;
pub mod tasks;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{CachingClient, Response, ResponseSource};
pub use error::ApiError;
pub use request::{Method, Request};
pub use tasks::TaskService;
pub use transport::{HttpTransport, Transport, DEFAULT_TIMEOUT_SECS};
