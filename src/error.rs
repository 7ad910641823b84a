//! Error types.

use thiserror::Error;

/// Returned when writing to a computed cell built without a write function.
///
/// The rejected write has no effect: the cached value is untouched and no
/// listener is notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("write to read-only computed cell")]
pub struct ReadOnlyWrite;
