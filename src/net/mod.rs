//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (parse, bind)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;
