//! Synchronization primitives for the publish path
//!
//! - [`CancellationToken`]: explicit shutdown flag passed into each component
//! - [`Mailbox`]: single-slot overwrite-latest handoff to a sender thread

pub mod cancel;
pub mod mailbox;

pub use cancel::{CancelListener, CancellationToken};
pub use mailbox::{Mailbox, PutOutcome};
