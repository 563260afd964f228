use std::sync::LazyLock;

use linetools_core::{LineRange, RangeError, SortSettings};
use regex::Regex;

use crate::EditError;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(%)|(\d+)(?:\s*,\s*(\d+))?)?").expect("address pattern is valid")
});

/// Line address of a command, as written (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// `%` or no address: every line.
    All,
    /// `N` or `N,M`.
    Lines { start: usize, end: Option<usize> },
}

impl Address {
    /// Resolve against a buffer of `len` lines.
    ///
    /// `Ok(None)` means there is nothing to address (an empty buffer).
    pub fn resolve(&self, len: usize) -> Result<Option<LineRange>, EditError> {
        match *self {
            Address::All => Ok(len.checked_sub(1).map(|last| LineRange { start: 0, end: last })),
            Address::Lines { start, end } => {
                let end = end.unwrap_or(start);
                if start == 0 || end == 0 {
                    return Err(EditError::new("line numbers are 1-based; 0 is not a valid address"));
                }
                let range = LineRange::new(start - 1, end - 1).map_err(|_| RangeError::Inverted { start, end })?;
                range.check_bounds(len).map_err(|_| RangeError::OutOfBounds { line: end, len })?;
                Ok(Some(range))
            }
        }
    }
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub addr: Address,
    pub cmd: Subcommand,
}

/// A command operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
    Sort(SortCommand),
    Cycle { alphabet: String },
    /// `!cmd`: filter the lines and replace them with the output.
    Filter { command: String },
    /// `w !cmd`: filter the lines and send the output to a sink.
    FilterOutput { command: String },
}

/// `sort[!] [flags]`; flags left unset fall back to the session settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortCommand {
    pub descending: bool,
    pub match_case: Option<bool>,
    pub natural: Option<bool>,
    pub remove_duplicates: Option<bool>,
}

impl SortCommand {
    pub fn settings(&self, session: SortSettings) -> SortSettings {
        SortSettings {
            match_case: self.match_case.unwrap_or(session.match_case),
            natural: self.natural.unwrap_or(session.natural),
            remove_duplicates: self.remove_duplicates.unwrap_or(session.remove_duplicates),
        }
    }
}

/// Parse commands from CLI argv, one command per element.
pub fn parse_commands_from_args(args: &[String]) -> Result<Vec<Command>, EditError> {
    args.iter().map(|a| parse_command(a)).collect()
}

/// Parse a script: one command per line; blank lines and `"` comments are skipped.
pub fn parse_commands_from_script(script: &str) -> Result<Vec<Command>, EditError> {
    script
        .lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('"')
        })
        .map(|(i, l)| {
            parse_command(l).map_err(|e| EditError::new(format!("line {}: {}", i + 1, e.message())))
        })
        .collect()
}

/// Parse a single command such as `2,5sort! i` or `%!tr a-z A-Z`.
pub fn parse_command(line: &str) -> Result<Command, EditError> {
    let (addr, rest) = parse_address(line)?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Err(EditError::new("missing command"));
    }
    let cmd = parse_subcommand(rest)?;
    Ok(Command { addr, cmd })
}

fn parse_address(line: &str) -> Result<(Address, &str), EditError> {
    let caps = ADDRESS
        .captures(line)
        .ok_or_else(|| EditError::new("invalid address"))?;
    let consumed = caps.get(0).map_or(0, |m| m.end());
    let number = |i: usize| -> Result<Option<usize>, EditError> {
        caps.get(i)
            .map(|m| {
                m.as_str()
                    .parse::<usize>()
                    .map_err(|_| EditError::new(format!("invalid line number: {:?}", m.as_str())))
            })
            .transpose()
    };

    let addr = if caps.get(1).is_some() {
        Address::All
    } else {
        match number(2)? {
            Some(start) => Address::Lines {
                start,
                end: number(3)?,
            },
            None => Address::All,
        }
    };
    Ok((addr, &line[consumed..]))
}

fn parse_subcommand(s: &str) -> Result<Subcommand, EditError> {
    if let Some(rest) = s.strip_prefix("sort") {
        return parse_sort(rest).map(Subcommand::Sort);
    }
    if let Some(rest) = s.strip_prefix("cycle") {
        let (alphabet, trailing) = parse_delimited(rest.trim_start())?;
        if !trailing.trim().is_empty() {
            return Err(EditError::new(format!(
                "unexpected trailing characters: {:?}",
                trailing
            )));
        }
        return Ok(Subcommand::Cycle { alphabet });
    }
    if let Some(rest) = s.strip_prefix('!') {
        return Ok(Subcommand::Filter {
            command: filter_command(rest)?,
        });
    }
    if let Some(rest) = s.strip_prefix('w') {
        let rest = rest.trim_start();
        let rest = rest
            .strip_prefix('!')
            .ok_or_else(|| EditError::new("w requires !command"))?;
        return Ok(Subcommand::FilterOutput {
            command: filter_command(rest)?,
        });
    }
    let c = s.chars().next().unwrap_or_default();
    Err(EditError::new(format!("unknown command: {c}")))
}

fn filter_command(rest: &str) -> Result<String, EditError> {
    let command = rest.trim();
    if command.is_empty() {
        return Err(EditError::new("missing filter command"));
    }
    Ok(command.to_string())
}

fn parse_sort(rest: &str) -> Result<SortCommand, EditError> {
    let mut sort = SortCommand::default();
    let flags = match rest.strip_prefix('!') {
        Some(flags) => {
            sort.descending = true;
            flags
        }
        None => rest,
    };
    for ch in flags.chars().filter(|c| !c.is_whitespace()) {
        match ch {
            'i' => sort.match_case = Some(false),
            'c' => sort.match_case = Some(true),
            'n' => sort.natural = Some(true),
            'l' => sort.natural = Some(false),
            'u' => sort.remove_duplicates = Some(true),
            'k' => sort.remove_duplicates = Some(false),
            _ => return Err(EditError::new(format!("unknown sort flag: {ch}"))),
        }
    }
    Ok(sort)
}

/// Parse a delimited string such as `/ab/` or `|a/b|` from the start of `input`.
///
/// The first character is the delimiter; letters, digits, whitespace and `\`
/// can't be one. `\` escapes the delimiter or itself; before anything else it
/// is kept literally. Returns (decoded, rest_after_closing_delim).
fn parse_delimited(input: &str) -> Result<(String, &str), EditError> {
    let mut chars = input.char_indices();
    let delim = match chars.next() {
        Some((_, c)) if !c.is_alphanumeric() && !c.is_whitespace() && c != '\\' => c,
        _ => return Err(EditError::new("missing delimiter")),
    };

    let mut out = String::new();
    let mut escaped = false;
    for (i, ch) in chars {
        if escaped {
            if ch != delim && ch != '\\' {
                out.push('\\');
            }
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delim {
            return Ok((out, &input[i + ch.len_utf8()..]));
        } else {
            out.push(ch);
        }
    }

    Err(EditError::new("unterminated delimited string"))
}
