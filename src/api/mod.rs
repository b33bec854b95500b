//! Backend session and request planning.
//!
//! Nothing here performs I/O: the client describes each request (method,
//! URL, body, timeout, authorization) and refuses to describe one when the
//! context it needs is missing.

pub mod client;
pub mod session;

pub use client::{ApiClient, ApiError, ApiRequest, FormPart, Method};
pub use session::AuthSession;
