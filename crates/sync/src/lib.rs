//! Lock coordination usable from blocking threads and async tasks alike.
//!
//! ## Key Components
//!
//! - **`wait`**: `Waitable<S>`, the single wait algorithm behind every
//!   primitive that both threads and tasks can block on.
//! - **`dual_mode`**: `DualModeLock`, one mutual-exclusion lock with blocking
//!   and async acquisition.
//! - **`registry`**: `LockRegistry`, named locks with a total acquisition
//!   order that rules out deadlock.
//! - **`coordinator`**: `AsyncLockCoordinator`, lazy once-only registration
//!   of the standard locks for async startup paths.
//! - **`config`**: `LockConfig` and the standard lock set.

pub mod config;
pub mod coordinator;
pub mod dual_mode;
pub mod registry;
pub mod wait;

pub use config::{default_standard_locks, LockConfig, LockSpec};
pub use coordinator::AsyncLockCoordinator;
pub use dual_mode::{DualModeGuard, DualModeLock, HolderSnapshot};
pub use registry::{LockRegistry, OrderedLock, RegistryGuard};
pub use wait::Waitable;
