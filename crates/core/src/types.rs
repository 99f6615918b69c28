//! Shared domain types for the coordination primitives

pub mod caller;
pub mod descriptor;

pub use caller::CallerId;
pub use descriptor::LockDescriptor;
