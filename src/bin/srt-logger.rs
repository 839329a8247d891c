//! CLI entry point: parses arguments, wraps the target program, and drives
//! the logger engine (spec §6).

use std::os::fd::RawFd;

use clap::Parser;

use srt_logger::config::LoggerConfig;
use srt_logger::severity::Severity;
use srt_logger::{diagnostics, launcher, pipeline, setup};

/// Wraps a child process, capturing its stdout and stderr into a rotating
/// log file, the system journal, and/or a terminal.
#[derive(Parser, Debug)]
#[command(name = "srt-logger", version, about)]
struct Cli {
    /// Fork into the background immediately; the wrapped program still
    /// runs to completion under the logger.
    #[arg(long)]
    background: bool,

    /// If the logger itself fails to start, exec the wrapped program
    /// directly instead of aborting.
    #[arg(long)]
    exec_fallback: bool,

    /// Log file name; defaults to `<identifier>.log`.
    #[arg(long)]
    filename: Option<String>,

    /// Program identifier used in filenames and the opening banner.
    #[arg(short = 't', long)]
    identifier: Option<String>,

    /// Inherited fd already connected to the system journal.
    #[arg(long)]
    journal_fd: Option<RawFd>,

    /// Directory to write the log file into.
    #[arg(short = 'd', long)]
    log_directory: Option<std::path::PathBuf>,

    /// Inherited fd to use for the log file instead of opening one.
    #[arg(long)]
    log_fd: Option<RawFd>,

    /// Disable automatic terminal detection; only use an explicit
    /// `--terminal-fd`.
    #[arg(long)]
    no_auto_terminal: bool,

    /// Rotation threshold, e.g. `8M`, `512KiB`, or `0` to disable.
    #[arg(long)]
    rotate: Option<String>,

    /// Write `export NAME=value` shell syntax on the ready pipe instead of
    /// bare `NAME=value` lines.
    #[arg(long)]
    sh_syntax: bool,

    /// Inherited fd to use for the terminal sink.
    #[arg(long)]
    terminal_fd: Option<RawFd>,

    /// Enable the journal sink, using `--journal-fd` or the default
    /// journal socket.
    #[arg(long)]
    use_journal: bool,

    /// Increase verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// The program to wrap, and its arguments.
    #[arg(trailing_var_arg = true, required = true)]
    command: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    diagnostics::set_program_name("srt-logger");
    launcher::ignore_sigpipe();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            diagnostics::fatal(&e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, config) {
        diagnostics::fatal(&e);
        if cli.exec_fallback {
            let _ = std::process::Command::new(&cli.command[0])
                .args(&cli.command[1..])
                .status();
        }
        std::process::exit(1);
    }
}

fn build_config(cli: &Cli) -> srt_logger::Result<LoggerConfig> {
    let mut builder = LoggerConfig::builder()
        .argv0(cli.command[0].clone())
        .background(cli.background)
        .sh_syntax(cli.sh_syntax)
        .parse_level_prefix(true)
        .use_journal(cli.use_journal || cli.journal_fd.is_some())
        .no_auto_terminal(cli.no_auto_terminal)
        .exec_fallback(cli.exec_fallback);

    if let Some(identifier) = &cli.identifier {
        builder = builder.identifier(identifier.clone());
    }
    if let Some(filename) = &cli.filename {
        builder = builder.filename(filename.clone());
    }
    if let Some(dir) = &cli.log_directory {
        builder = builder.log_dir(dir.clone());
    }
    if let Some(fd) = cli.log_fd {
        builder = builder.file_fd(fd);
    }
    if let Some(fd) = cli.journal_fd {
        builder = builder.journal_fd(fd);
    }
    if let Some(fd) = cli.terminal_fd {
        builder = builder.terminal_fd(fd);
    }
    if let Some(rotate) = &cli.rotate {
        builder = builder.max_bytes(srt_logger::parameters::parse_byte_size(rotate)?);
    }
    if cli.verbose > 0 {
        builder = builder.default_line_level(verbosity_to_level(cli.verbose));
    }

    Ok(builder.build())
}

fn verbosity_to_level(verbose: u8) -> Severity {
    match verbose {
        0 => Severity::Info,
        1 => Severity::Debug,
        _ => Severity::Debug,
    }
}

fn run(cli: &Cli, config: LoggerConfig) -> srt_logger::Result<()> {
    let background = config.background;

    let launched = launcher::launch(background, move |data_read_fd, ready_write_fd| {
        run_engine_child(data_read_fd, ready_write_fd, config)
    })?;

    // Echo shell-syntax assignments to our own stdout, before it gets
    // dup2'd away onto the data pipe (spec §4.6 step 5).
    for assignment in &launched.env_assignments {
        if assignment.exported {
            println!("export {}={}", assignment.name, assignment.value);
        }
    }
    for assignment in &launched.env_assignments {
        std::env::set_var(&assignment.name, &assignment.value);
    }

    launcher::exec_wrapped(launched.data_write, &cli.command)?;
    unreachable!("exec_wrapped only returns on error, which is propagated above");
}

/// Runs inside the forked logger process: performs setup, signals
/// readiness, then streams the wrapped program's output until EOF.
fn run_engine_child(data_read_fd: RawFd, ready_write_fd: RawFd, config: LoggerConfig) -> ! {
    use std::io::Write;
    use std::os::fd::FromRawFd;

    let outcome = match setup::setup(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            diagnostics::fatal(&e);
            std::process::exit(1);
        }
    };
    let mut state = outcome.state;
    let mut sinks = outcome.sinks;

    let mut ready = unsafe { std::fs::File::from_raw_fd(ready_write_fd) };
    let _ = writeln!(ready, "SRT_LOGGER_PID={}", std::process::id());
    for (name, value) in srt_logger::env_projection::project(&config, &sinks) {
        let value = value.to_string_lossy();
        if config.sh_syntax {
            let _ = writeln!(ready, "export {name}={value}");
        } else {
            let _ = writeln!(ready, "{name}={value}");
        }
    }
    let _ = ready.write_all(b"SRT_LOGGER_READY=1\n");
    drop(ready);

    let mut input = unsafe { std::fs::File::from_raw_fd(data_read_fd) };
    let rotate_after_write = |state: &mut srt_logger::state::LoggerState,
                               sinks: &mut srt_logger::sinks::SinkSet| {
        if let Some(file) = &mut sinks.file {
            file.maybe_rotate(state);
        }
    };
    let _ = pipeline::run(&mut input, &mut state, &mut sinks, rotate_after_write);
    std::process::exit(0);
}
