use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod firmware;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one record (JSON) into a frame.
    Encode(EncodeArgs),
    /// Decode a captured byte stream into records.
    Decode(DecodeArgs),
    /// Firmware image tooling.
    Firmware(FirmwareArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Firmware(args) => match args.command {
            FirmwareCommand::Plan(args) => firmware::plan(args, format),
        },
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Record as JSON, e.g. '{"kind":"ack"}'. Read from stdin when neither
    /// --json nor --file is given.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON record from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Write the frame bytes to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode ("-" or omitted: stdin).
    pub input: Option<PathBuf>,
    /// Input is hex text (whitespace and commas ignored).
    #[arg(long)]
    pub hex: bool,
    /// Exit with a failure code if any frame was rejected.
    #[arg(long)]
    pub strict: bool,
    /// Stop after N valid records.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub command: FirmwareCommand,
}

#[derive(Subcommand, Debug)]
pub enum FirmwareCommand {
    /// Show how an image is split into update records.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Firmware image file.
    pub image: PathBuf,
    /// Flash address of the first image byte (decimal or 0x-prefixed hex).
    #[arg(long, default_value = "0", value_parser = parse_address)]
    pub base_address: u32,
    /// Write the encoded update sequence to a file.
    #[arg(long, value_name = "FILE")]
    pub emit: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_address(input: &str) -> Result<u32, String> {
    let input = input.trim().replace('_', "");
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid address `{input}`: {err}"))
}
