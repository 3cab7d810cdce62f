//! Retrieval-augmented answering: query state machine and result types.

pub mod pipeline;
pub mod types;

pub use pipeline::{QueryRun, RagPipeline, RetryPolicy};
pub use types::{Answer, AnswerReport, QueryFailure, QueryState, SourceRef};
