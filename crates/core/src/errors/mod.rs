//! Error types and helpers for rampart operations

mod builders;
mod conversions;
mod display;
mod extensions;
mod types;

pub use extensions::*;
pub use types::{CallError, Error, Result};
