mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "byteframe", version, about = "Byte-stream message framing CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);

    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parse_subcommand() {
        let cli = Cli::try_parse_from([
            "byteframe",
            "parse",
            "--config",
            "/tmp/frames.json",
            "capture.bin",
            "--strict",
            "--count",
            "3",
        ])
        .expect("parse args should parse");

        match cli.command {
            Command::Parse(args) => {
                assert!(args.strict);
                assert_eq!(args.count.map(|n| n.get()), Some(3));
                assert_eq!(
                    args.input.as_deref(),
                    Some(std::path::Path::new("capture.bin"))
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_count() {
        let err = Cli::try_parse_from([
            "byteframe",
            "parse",
            "--config",
            "/tmp/frames.json",
            "--count",
            "0",
        ])
        .expect_err("zero count should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "byteframe",
            "encode",
            "--config",
            "/tmp/frames.json",
            "--id",
            "1",
            "--data",
            "hi",
            "--hex",
            "6869",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn format_is_global() {
        let cli = Cli::try_parse_from([
            "byteframe",
            "check",
            "--config",
            "/tmp/frames.json",
            "--format",
            "json",
        ])
        .expect("check args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Check(_)));
    }
}
