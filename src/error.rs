//! # Error Types

/// Errors from pattern compilation and generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandexpError {
    /// The pattern source is malformed.
    #[error("invalid pattern at offset {offset}: {reason}")]
    InvalidPattern {
        /// Byte offset into the source where the problem was found.
        offset: usize,
        /// What went wrong.
        reason: String,
    },

    /// The pattern uses syntax outside the supported token kinds.
    #[error("unsupported syntax at offset {offset}: {construct}")]
    UnsupportedSyntax {
        /// Byte offset into the source of the construct.
        offset: usize,
        /// The construct, as written.
        construct: String,
    },

    /// A flag letter that has no meaning for generation.
    #[error("unknown flag '{0}'")]
    InvalidFlag(char),

    /// Replay asked for another decision after the log ran out.
    #[error("replay log exhausted after {consumed} decisions")]
    ExhaustedReplayLog {
        /// How many decisions were replayed before running out.
        consumed: usize,
    },

    /// A replayed value does not fit the choice point it was replayed into.
    #[error("replayed value {value} at position {position} is outside {min}..={max}")]
    InvalidReplayValue {
        /// Index of the value in the replay log.
        position: usize,
        /// The offending value.
        value: usize,
        /// Smallest value the choice point accepts.
        min: usize,
        /// Largest value the choice point accepts.
        max: usize,
    },

    /// A textual decision log could not be parsed.
    #[error("invalid decision log: {0}")]
    InvalidDecisionLog(String),
}

/// Result type for randexp operations.
pub type Result<T> = core::result::Result<T, RandexpError>;
