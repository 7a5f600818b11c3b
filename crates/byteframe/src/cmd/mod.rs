use clap::{Args, Subcommand};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use byteframe_config::{parse_byte, ParserConfig};

use crate::exit::{config_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod check;
pub mod encode;
pub mod parse;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a byte stream and print completed messages and errors.
    Parse(ParseArgs),
    /// Validate a parser configuration and print its descriptor table.
    Check(CheckArgs),
    /// Encode one message in wire form.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Parse(args) => parse::run(args, format),
        Command::Check(args) => check::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Parser configuration (JSON).
    #[arg(long, short = 'c', env = "BYTEFRAME_CONFIG")]
    pub config: PathBuf,
    /// Input file. Reads stdin when absent or `-`.
    pub input: Option<PathBuf>,
    /// Treat input as hex text instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Exit after N completed messages (at least 1).
    #[arg(long)]
    pub count: Option<NonZeroUsize>,
    /// Exit with status 60 if any parse error occurred.
    #[arg(long)]
    pub strict: bool,
    /// Largest payload accepted before the parser is reset.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Parser configuration (JSON).
    #[arg(long, short = 'c', env = "BYTEFRAME_CONFIG")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Parser configuration (JSON).
    #[arg(long, short = 'c', env = "BYTEFRAME_CONFIG")]
    pub config: PathBuf,
    /// Message identifier (decimal or 0x-prefixed hex).
    #[arg(long)]
    pub id: String,
    /// Payload as text.
    #[arg(long, conflicts_with = "hex")]
    pub data: Option<String>,
    /// Payload as hex.
    #[arg(long, conflicts_with = "data")]
    pub hex: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_config(path: &Path) -> CliResult<ParserConfig> {
    ParserConfig::from_path(path).map_err(|err| config_error("config", err))
}

pub(crate) fn parse_id(text: &str) -> CliResult<u8> {
    parse_byte(text).ok_or_else(|| CliError::new(USAGE, format!("invalid identifier: {text:?}")))
}

/// Decode hex text. Whitespace, commas and `0x` prefixes between bytes are ignored.
pub(crate) fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let mut digits = String::with_capacity(text.len());
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }
    if !digits.is_ascii() {
        return Err("input contains non-hex characters".to_string());
    }
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = &digits[i..i + 2];
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte {pair:?}"))
        })
        .collect()
}
