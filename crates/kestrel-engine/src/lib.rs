//! Search and evaluation for kestrel.
//!
//! [`Searcher`] runs one iterative-deepening negascout search over a root
//! position. [`Engine`] wraps it in a worker thread with time management,
//! pondering and cancellation.

pub mod engine;
pub mod error;
pub mod eval;
pub mod listener;
pub mod params;
pub mod search;
pub mod time;

pub use engine::{Engine, EngineConfig, SearchOutcome};
pub use error::{EngineError, Interrupted, ParamError};
pub use eval::Evaluator;
pub use listener::{PvInfo, ReportedScore, ScoreBound, SearchListener, TracingListener};
pub use params::Parameters;
pub use search::control::SearchControl;
pub use search::tt::TranspositionTable;
pub use search::{MATE0, Searcher};
pub use time::{GoParams, Limits, compute_time_limits};
