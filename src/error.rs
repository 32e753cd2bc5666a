use thiserror::Error;

use crate::emulation::EmulationError;

/// Builds an [`Error::Configuration`] with the source location attached.
macro_rules! config_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Configuration {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Configuration {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Note that an exception that no clause of a landing pad handles is *not* an error. It is
/// returned as [`LandingPadOutcome::Resume`](crate::LandingPadOutcome::Resume) so the caller can
/// keep unwinding. Everything in this enum indicates that the interpreter state or the landing
/// pad definition is inconsistent.
///
/// # Error Categories
///
/// - [`Error::Emulation`] - Fatal interpreter faults raised while evaluating a landing pad
///   (empty exception slot, wrong slot kinds, unresolvable addresses, invalid memory)
/// - [`Error::Configuration`] - A landing pad or runtime context was assembled incorrectly
/// - [`Error::FileError`] - The trace output file could not be opened
///
/// # Examples
///
/// ```rust
/// use landingpad::{Error, LandingPad};
///
/// match LandingPad::builder().build() {
///     Err(Error::Configuration { message, .. }) => assert!(message.contains("exception slot")),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A fatal interpreter fault.
    ///
    /// These are never matched against landing-pad clauses. They terminate the current
    /// evaluation because the surrounding interpreter state is corrupt.
    #[error(transparent)]
    Emulation(#[from] EmulationError),

    /// Invalid construction of a landing pad or runtime component.
    ///
    /// # Fields
    ///
    /// * `message` - What was wrong with the configuration
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Configuration - {file}:{line}: {message}")]
    Configuration {
        /// The message to be printed for the Configuration error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    ///
    /// Raised when file-based tracing is requested but the output file cannot be opened.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl Error {
    /// Returns the wrapped interpreter fault, if this is one.
    #[must_use]
    pub fn as_emulation(&self) -> Option<&EmulationError> {
        match self {
            Error::Emulation(inner) => Some(inner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_macro() {
        let err = config_error!("missing {}", "stack slot");
        match &err {
            Error::Configuration { message, file, .. } => {
                assert_eq!(message, "missing stack slot");
                assert!(file.ends_with("error.rs"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(err.as_emulation().is_none());
    }

    #[test]
    fn test_emulation_conversion() {
        let err: Error = EmulationError::MissingException { slot: 3 }.into();
        assert_eq!(
            err.as_emulation(),
            Some(&EmulationError::MissingException { slot: 3 })
        );
        assert!(format!("{err}").contains("slot 3"));
    }
}
