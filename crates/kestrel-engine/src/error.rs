//! Engine error types.

/// Marker returned through every search frame when the search is cancelled.
///
/// This is a normal termination path, not a failure: iterative deepening
/// catches it and reports the last completed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search interrupted")]
pub struct Interrupted;

/// Errors from setting tunable parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// No parameter with that name exists.
    #[error("unknown parameter: {name}")]
    Unknown {
        /// The requested parameter name.
        name: String,
    },

    /// The value lies outside the parameter's allowed range.
    #[error("value {value} for {name} outside {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: i32,
        /// Smallest allowed value.
        min: i32,
        /// Largest allowed value.
        max: i32,
    },
}

/// Errors from driving the engine worker.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A search is already running on this engine.
    #[error("a search is already running")]
    Busy,

    /// The worker thread panicked.
    #[error("search thread panicked")]
    WorkerPanicked,
}
