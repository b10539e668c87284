//! Read-only client for the application registry.
//!
//! The registry is the system of record mapping a DSN to the monitored
//! application it belongs to. The gateway consults it before forwarding a
//! v1 batch; it never writes to it.

pub mod client;

pub use client::{Application, ApplicationStore, ClientError, HttpClient};
