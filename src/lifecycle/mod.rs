//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Connect store → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, health monitor exits
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
