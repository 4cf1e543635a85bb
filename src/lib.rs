//! Batch fan-out handler library.

pub mod config;
pub mod fanout;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::FanoutConfig;
pub use fanout::{handle, AggregateResult, CallOutcome, Dispatcher, FanoutError, Invocation};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
