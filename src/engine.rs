use std::fmt;

use linetools_core::{
    char_set, cycle, find_char, join_lines, process, CharMotion, Direction, LineOrder, LineRange,
    Terminators,
};

use crate::buffer::{LineBuffer, Selection};
use crate::config::Config;
use crate::filter::{run_filter, FilterOptions, FilterSpec};
use crate::parse::{Command, Subcommand};
use crate::sink::OutputSink;
use crate::EditError;

/// Line terminators never take part in cycling, so line count is preserved.
const LINE_BREAKS: [char; 2] = ['\n', '\r'];

/// What an operation did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Nothing was changed; the caller should alert the user.
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No line range could be resolved from the selection or address.
    UnresolvedRange,
    /// The operation needs at least two lines.
    SingleLine,
    /// The filter ran but exited unsuccessfully.
    FilterFailed { code: Option<i32> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnresolvedRange => write!(f, "no line range selected"),
            SkipReason::SingleLine => write!(f, "range spans a single line"),
            SkipReason::FilterFailed { code: Some(code) } => write!(f, "filter exited with status {code}"),
            SkipReason::FilterFailed { code: None } => write!(f, "filter was terminated by a signal"),
        }
    }
}

/// Distinct alphabet characters minus line breaks.
fn cycle_alphabet(alphabet: &str) -> String {
    char_set(alphabet).without(&LINE_BREAKS).iter().collect()
}

impl LineBuffer {
    /// Sort the lines in `range`, optionally removing duplicates first.
    ///
    /// Lines are compared without their terminators and each keeps its own.
    /// If the range ends unterminated, the block still ends unterminated; the
    /// moved line trades terminators with the one sorted last.
    pub fn sort_lines(
        &mut self,
        range: Option<LineRange>,
        remove_duplicates: bool,
        order: LineOrder,
    ) -> Result<Outcome, EditError> {
        let Some(range) = range else {
            return Ok(Outcome::Skipped(SkipReason::UnresolvedRange));
        };
        if range.is_single_line() {
            return Ok(Outcome::Skipped(SkipReason::SingleLine));
        }
        range.check_bounds(self.line_count())?;
        let lines: Vec<&str> = range.indices().filter_map(|i| self.line(i)).collect();
        let sorted = process(&lines, remove_duplicates, Some(order));
        log::trace!("sorted {} lines into {}", lines.len(), sorted.len());

        let block = join_lines(&sorted, Terminators::Kept);
        let lines = block.split_inclusive('\n').map(str::to_string).collect();
        self.replace_lines(range, lines)?;
        Ok(Outcome::Applied)
    }

    /// Cycle `alphabet` across the whole block of lines in `range`.
    pub fn cycle_lines(
        &mut self,
        range: Option<LineRange>,
        alphabet: &str,
    ) -> Result<Outcome, EditError> {
        let Some(range) = range else {
            return Ok(Outcome::Skipped(SkipReason::UnresolvedRange));
        };
        range.check_bounds(self.line_count())?;
        let block: String = range.indices().filter_map(|i| self.line(i)).collect();
        let alphabet = cycle_alphabet(alphabet);

        let cycled = cycle(&block, Some(alphabet.as_str()));
        let lines = cycled.split_inclusive('\n').map(str::to_string).collect();
        self.replace_lines(range, lines)?;
        Ok(Outcome::Applied)
    }

    /// Cycle within a selection, or across the caret's line when collapsed.
    pub fn cycle_selection(
        &mut self,
        selection: Selection,
        alphabet: &str,
    ) -> Result<Outcome, EditError> {
        if selection.is_collapsed() {
            let line = self.line_of_offset(selection.head).map(LineRange::single);
            return self.cycle_lines(line, alphabet);
        }
        if selection.end() > self.char_len() {
            return Ok(Outcome::Skipped(SkipReason::UnresolvedRange));
        }
        let selected: String = self
            .text()
            .chars()
            .skip(selection.start())
            .take(selection.end() - selection.start())
            .collect();
        let alphabet = cycle_alphabet(alphabet);
        let cycled = cycle(&selected, Some(alphabet.as_str()));
        self.replace_chars(selection.start(), selection.end(), &cycled)?;
        Ok(Outcome::Applied)
    }

    /// Pipe the lines in `range` through `spec` and replace them with its
    /// standard output, one terminated line per output line.
    ///
    /// Standard error never reaches the buffer; it is logged and appended to
    /// the sink named after the command. An unsuccessful exit leaves the
    /// buffer untouched.
    pub fn filter_lines(
        &mut self,
        range: Option<LineRange>,
        spec: &FilterSpec,
        options: FilterOptions,
        sink: &mut dyn OutputSink,
    ) -> Result<Outcome, EditError> {
        let Some(range) = range else {
            return Ok(Outcome::Skipped(SkipReason::UnresolvedRange));
        };
        let result = run_filter(spec, &self.range_contents(range)?, options)?;
        if !result.success() {
            log::info!("filter {:?} failed ({}); buffer unchanged", spec.command_line(), result.status);
            return Ok(Outcome::Skipped(SkipReason::FilterFailed {
                code: result.status.code(),
            }));
        }
        for line in &result.stderr {
            log::warn!("{}: {line}", spec.command_line());
        }
        if !result.stderr.is_empty() {
            sink.write_err(spec.command_line(), &result.stderr);
        }

        let block = join_lines(&result.stdout, Terminators::Rejoin(self.line_ending()));
        let lines = block.split_inclusive('\n').map(str::to_string).collect();
        self.replace_lines(range, lines)?;
        Ok(Outcome::Applied)
    }

    /// Pipe the lines in `range` through `spec` and append its output to the
    /// sink named after the command. The buffer is never modified.
    pub fn filter_to_sink(
        &self,
        range: Option<LineRange>,
        spec: &FilterSpec,
        options: FilterOptions,
        sink: &mut dyn OutputSink,
    ) -> Result<Outcome, EditError> {
        let Some(range) = range else {
            return Ok(Outcome::Skipped(SkipReason::UnresolvedRange));
        };
        let result = run_filter(spec, &self.range_contents(range)?, options)?;
        if !result.success() {
            log::info!("filter {:?} failed ({})", spec.command_line(), result.status);
            return Ok(Outcome::Skipped(SkipReason::FilterFailed {
                code: result.status.code(),
            }));
        }
        sink.write_out(spec.command_line(), &result.stdout);
        sink.write_err(spec.command_line(), &result.stderr);
        Ok(Outcome::Applied)
    }

    /// Move a caret to the `count`-th `target` on its line; returns the new offset.
    pub fn find_char(
        &self,
        caret: usize,
        target: char,
        motion: CharMotion,
        match_case: bool,
        count: usize,
    ) -> Option<usize> {
        let line = self.line_of_offset(caret)?;
        let start = self.line_start(line)?;
        let content = self.line_content(line)?;
        find_char(content, caret - start, target, motion, match_case, count).map(|col| start + col)
    }
}

/// Result of applying a command script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    /// Full edited content.
    pub text: String,
    /// Edited content split into lines (without terminators).
    pub lines: Vec<String>,
    /// 1-based line numbers that are new or changed.
    pub modified: Vec<usize>,
    /// One outcome per command, in order.
    pub outcomes: Vec<Outcome>,
}

struct Engine<'a> {
    buffer: LineBuffer,
    config: &'a Config,
    sink: &'a mut dyn OutputSink,
}

impl Engine<'_> {
    fn apply_command(&mut self, cmd: &Command) -> Result<Outcome, EditError> {
        let range = cmd.addr.resolve(self.buffer.line_count())?;
        log::debug!("applying {:?} to {:?}", cmd.cmd, range);
        match &cmd.cmd {
            Subcommand::Sort(sort) => {
                let settings = sort.settings(self.config.sort_settings());
                let direction = if sort.descending {
                    Direction::Descending
                } else {
                    Direction::Ascending
                };
                self.buffer
                    .sort_lines(range, settings.remove_duplicates, settings.order(direction))
            }
            Subcommand::Cycle { alphabet } => self.buffer.cycle_lines(range, alphabet),
            Subcommand::Filter { command } => {
                let spec = FilterSpec::parse(command)?;
                let options = self.config.filter_options();
                self.buffer.filter_lines(range, &spec, options, &mut *self.sink)
            }
            Subcommand::FilterOutput { command } => {
                let spec = FilterSpec::parse(command)?;
                let options = self.config.filter_options();
                self.buffer.filter_to_sink(range, &spec, options, &mut *self.sink)
            }
        }
    }
}

/// Apply `commands` to `input`.
///
/// Commands run in order against the edited text. The first error aborts the
/// whole script and no edited text is returned, so callers never see a
/// partial edit. Sink output is not buffered: whatever earlier `w !` commands
/// (or filter stderr) wrote to `sink` stays there.
pub fn edit_text(
    input: &str,
    commands: &[Command],
    config: &Config,
    sink: &mut dyn OutputSink,
) -> Result<EditResult, EditError> {
    let mut eng = Engine {
        buffer: LineBuffer::from_text(input),
        config,
        sink,
    };
    let mut outcomes = Vec::with_capacity(commands.len());
    for c in commands {
        outcomes.push(eng.apply_command(c)?);
    }

    let buffer = eng.buffer;
    Ok(EditResult {
        text: buffer.text(),
        lines: buffer.contents().into_iter().map(str::to_string).collect(),
        modified: buffer.modified_lines(),
        outcomes,
    })
}
