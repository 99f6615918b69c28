//! Core error taxonomy and shared types for `rampart`.
//!
//! Every other crate in the workspace builds on the types defined here.
//!
//! ## Key Components
//!
//! - **`errors`**: The `Error` enum for signals the primitives originate
//!   themselves (registration misuse, order violations, timeouts, open
//!   circuits, full pools), plus `CallError<E>` which carries a wrapped
//!   operation's own error back to the caller untouched.
//! - **`types`**: `CallerId` and the `LockDescriptor` diagnostic snapshot.
//! - **`constants`**: Default limits and timeouts.
//! - **`serde_helpers`**: Millisecond (de)serialization for durations in config.

pub mod constants;
pub mod errors;
pub mod serde_helpers;
pub mod types;

pub use self::{
    constants::*,
    errors::{CallError, Error, ErrorKind, Result},
    types::*,
};
