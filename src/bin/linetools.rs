use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use linetools::{
    edit_text, parse_commands_from_args, parse_commands_from_script, Command, Config,
    ConfigError, EditError, Outcome, OutputSink,
};

/// Sort, cycle and filter ranges of lines in a file.
///
/// Default mode edits <FILE> in place and prints the lines that changed.
/// Commands are passed as separate argv tokens, e.g. `%sort u` or `2,9!tr a-z A-Z`.
#[derive(Parser, Debug)]
#[command(name = "linetools", version, about, long_about = None)]
struct Cli {
    /// Don't write the file; stdout shows what would change
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Read input from stdin (FILE must be '-') and print the whole result
    #[arg(long = "stdin")]
    stdin: bool,

    /// Read commands from a script file, one per line, before any argv commands
    #[arg(short = 's', long = "script", value_name = "FILE")]
    script: Option<PathBuf>,

    /// Compare case-insensitively unless a command says otherwise
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// Remove duplicate lines when sorting unless a command says otherwise
    #[arg(short = 'u', long = "unique")]
    unique: bool,

    /// Use natural order when sorting unless a command says otherwise
    #[arg(short = 'n', long = "natural")]
    natural: bool,

    /// Kill filters that run longer than this many seconds
    #[arg(long = "timeout", value_name = "SECS")]
    timeout: Option<u64>,

    /// Load configuration from a specific file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Increase logging verbosity (repeat for more detail)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbosity: u8,

    /// File to edit, or '-' with --stdin
    #[arg(value_name = "FILE")]
    file: String,

    /// Commands to apply in order
    #[arg(value_name = "COMMANDS", trailing_var_arg = true)]
    commands: Vec<String>,
}

impl Cli {
    fn config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if self.ignore_case {
            config.match_case = false;
        }
        if self.unique {
            config.remove_duplicates = true;
        }
        if self.natural {
            config.natural_order = true;
        }
        if self.timeout.is_some() {
            config.filter_timeout_secs = self.timeout;
        }
        Ok(config)
    }
}

/// Prints sink output as it arrives. Stdout belongs to the document in
/// `--stdin` mode, so filter output goes to stderr there.
struct ConsoleSink {
    out_to_stderr: bool,
}

impl OutputSink for ConsoleSink {
    fn write_out(&mut self, name: &str, lines: &[String]) {
        if self.out_to_stderr {
            for line in lines {
                eprintln!("{name}> {line}");
            }
        } else {
            for line in lines {
                println!("{line}");
            }
        }
    }

    fn write_err(&mut self, name: &str, lines: &[String]) {
        for line in lines {
            eprintln!("{name}: {line}");
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Failures that end a run, with the exit code each maps to.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("with --stdin, file must be '-' (got '{0}')")]
    StdinNeedsDash(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read script {}: {source}", .path.display())]
    Script { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("binary file rejected (NUL byte found)")]
    Binary,
    #[error("non-UTF8 file rejected")]
    NotUtf8,
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
}

impl CliError {
    /// 1 for I/O and unusable input, 2 for usage, parse and edit errors.
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Read { .. }
            | CliError::Binary
            | CliError::NotUtf8
            | CliError::Write { .. } => 1,
            CliError::StdinNeedsDash(_)
            | CliError::Config(_)
            | CliError::Script { .. }
            | CliError::Edit(_) => 2,
        }
    }
}

/// Accept only NUL-free UTF-8 text.
fn decode_text(bytes: Vec<u8>) -> Result<String, CliError> {
    if bytes.contains(&0) {
        return Err(CliError::Binary);
    }
    String::from_utf8(bytes).map_err(|_| CliError::NotUtf8)
}

/// Replace `path` with `content` via a temp file in the same directory, so
/// readers see either the old or the new file. Permissions are carried over.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new().prefix(".linetools.").tempfile_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn load_commands(cli: &Cli) -> Result<Vec<Command>, CliError> {
    let mut commands = Vec::new();
    if let Some(path) = &cli.script {
        let script = fs::read_to_string(path).map_err(|source| CliError::Script {
            path: path.clone(),
            source,
        })?;
        commands = parse_commands_from_script(&script)?;
    }
    commands.extend(parse_commands_from_args(&cli.commands)?);
    Ok(commands)
}

fn read_input(cli: &Cli) -> Result<String, CliError> {
    let read_err = |source| CliError::Read {
        path: cli.file.clone(),
        source,
    };
    if cli.stdin {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes).map_err(read_err)?;
        return decode_text(bytes);
    }
    decode_text(fs::read(&cli.file).map_err(read_err)?)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.stdin && cli.file != "-" {
        return Err(CliError::StdinNeedsDash(cli.file.clone()));
    }
    let config = cli.config()?;
    let commands = load_commands(cli)?;
    let input = read_input(cli)?;

    let mut sink = ConsoleSink {
        out_to_stderr: cli.stdin,
    };
    let result = edit_text(&input, &commands, &config, &mut sink)?;

    for (n, outcome) in result.outcomes.iter().enumerate() {
        if let Outcome::Skipped(reason) = outcome {
            eprintln!("warning: command {} skipped: {reason}", n + 1);
        }
    }

    if cli.stdin {
        print!("{}", result.text);
        return Ok(());
    }

    if !cli.dry_run && result.text != input {
        write_atomic(Path::new(&cli.file), &result.text).map_err(|source| CliError::Write {
            path: cli.file.clone(),
            source,
        })?;
    }

    for lineno in &result.modified {
        if let Some(line) = result.lines.get(lineno - 1) {
            println!("{lineno}  {line}");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    if let Err(e) = run(&cli) {
        log::debug!("{e:?}");
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}
