// # torcycle-core
//
// Core library for rotating the Tor exit address.
//
// ## Architecture Overview
//
// - **ServiceManager**: Trait for controlling the daemon's lifecycle
// - **AddressProbe**: Trait for reading back the exit address
// - **Console**: Trait for the operator terminal
// - **Rotator**: Engine that runs reload → settle → probe → wait cycles
// - **Session**: The interactive run, from banner to final stop
// - **Lifecycle**: RUNNING / TERMINATING state shared with the signal listeners
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Process control and HTTP live in their own crates
// 2. **Single Cleanup Point**: Cancellation unwinds to the session, which stops the daemon once
// 3. **Best Effort Cleanup**: Stop failures are logged, never escalated
// 4. **Library-First**: The binary only wires implementations together

pub mod traits;
pub mod engine;
pub mod session;
pub mod lifecycle;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressProbe, Console, ServiceManager};
pub use engine::{Rotator, RotatorEvent};
pub use session::{Session, SessionEnd};
pub use lifecycle::{Lifecycle, LifecycleState, TerminationReason};
pub use config::{Messages, RotatorConfig, SessionParams};
pub use error::{Error, Result};
