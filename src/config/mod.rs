//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FanoutConfig (validated, immutable)
//!     → dispatcher built from it, shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in a dispatcher built from the new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::FanoutConfig;
pub use schema::{
    DispatchConfig, DownstreamConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    SecurityConfig, TimeoutConfig,
};
