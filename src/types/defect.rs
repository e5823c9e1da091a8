//! Defect payloads for unexpected failures.
//!
//! A defect is a failure the application did not model as an error value:
//! a panic escaping user code, or a condition user code explicitly declared
//! unrecoverable. Defects are the only failures this crate reports through
//! diagnostic output; expected error values stay silent.

use core::fmt;
use std::any::Any;

/// Payload describing an unexpected failure.
///
/// This wraps the failure description for safe transport across task
/// boundaries; a caught panic payload is reduced to its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectPayload {
    message: String,
}

impl DefectPayload {
    /// Creates a new defect payload with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a defect payload from a caught panic payload.
    ///
    /// `&str` and `String` panic payloads keep their message; anything else
    /// is reported as opaque.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "opaque panic payload".to_string());
        Self { message }
    }

    /// Returns the defect message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DefectPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "defect: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_panic_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let defect = DefectPayload::from_panic(payload);
        assert_eq!(defect.message(), "boom");
    }

    #[test]
    fn from_panic_string() {
        let payload: Box<dyn Any + Send> = Box::new("kaboom".to_string());
        let defect = DefectPayload::from_panic(payload);
        assert_eq!(defect.message(), "kaboom");
    }

    #[test]
    fn from_panic_opaque() {
        let payload: Box<dyn Any + Send> = Box::new(17_u32);
        let defect = DefectPayload::from_panic(payload);
        assert_eq!(defect.message(), "opaque panic payload");
    }

    #[test]
    fn display_format() {
        let defect = DefectPayload::new("something went wrong");
        assert_eq!(format!("{defect}"), "defect: something went wrong");
    }
}
