//! Command handlers for the statute CLI.

pub mod ask;
pub mod index;
pub mod prompts;
pub mod stats;

pub use ask::AskCommand;
pub use index::IndexCommand;
pub use prompts::PromptsCommand;
pub use stats::StatsCommand;
