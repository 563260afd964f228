//! linetools — line-range text tools
//!
//! Sorting (collation or natural order, optional duplicate removal),
//! character cycling and external filters over ranges of lines, plus the
//! line buffer, command parser and configuration behind the `linetools` CLI.

mod buffer;
mod config;
mod engine;
mod filter;
mod parse;
mod sink;

pub use buffer::{LineBuffer, Selection};
pub use config::{Config, ConfigError};
pub use engine::{edit_text, EditResult, Outcome, SkipReason};
pub use filter::{run_filter, FilterError, FilterOptions, FilterSpec, ProcessResult};
pub use parse::{
    parse_command, parse_commands_from_args, parse_commands_from_script, Address, Command,
    SortCommand, Subcommand,
};
pub use sink::{MemorySink, NullSink, OutputSink, SinkChannels};

pub use linetools_core::{
    char_set, collate, cycle, find_char, natural_cmp, process, CaseSensitivity, CharMotion,
    CharSet, Direction, LineOrder, LineRange, OrderKind, RangeError, SortSettings, Terminators,
};

/// Error raised while parsing or applying commands.
///
/// Nothing is modified when an operation fails with one of these.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl EditError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Human-friendly error message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
