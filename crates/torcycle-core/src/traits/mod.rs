//! Core traits for torcycle
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ServiceManager`]: Control the daemon's lifecycle
//! - [`AddressProbe`]: Read back the exit address through the daemon
//! - [`Console`]: The operator terminal

pub mod service_manager;
pub mod address_probe;
pub mod console;

pub use service_manager::{CommandStatus, ControlBackend, DaemonState, ServiceAction, ServiceManager};
pub use address_probe::AddressProbe;
pub use console::{Console, Progress};
