//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request ID, tracing span)
//!     → fanout::handle (validate, dispatch, aggregate)
//!     → response.rs (status + JSON payload)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, Runtime};
