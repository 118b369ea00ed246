mod commands;
mod history;

pub use commands::Command;
pub use history::StrokeHistory;

pub use crate::error::CommandError;

/// Result type for undo/redo operations
pub type CommandResult<T = ()> = Result<T, CommandError>;
