use clap::{Args, Subcommand};
use std::path::PathBuf;

use serialcomm_frame::{MessageKind, DEFAULT_HIGH_WATER_MARK, DEFAULT_STORE_CAPACITY};

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod checksum;
pub mod decode;
pub mod encode;
pub mod kinds;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message into a frame.
    Encode(EncodeArgs),
    /// Decode a captured byte stream and print the stored messages.
    Decode(DecodeArgs),
    /// Compute the LRC check byte of a payload.
    Checksum(ChecksumArgs),
    /// List message kinds with their type tags and payload layouts.
    Kinds,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Kinds => kinds::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message kind (e.g. Timestamp, throttle-setting, max_current).
    pub kind: MessageKind,
    /// Value: text for Debug/Error, integer, on/off for PowerSetting, or float.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Bytes as hex (spaces, commas and 0x prefixes are ignored).
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read raw bytes from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Bytes delivered to the receiver per read, as a serial driver would.
    #[arg(long, default_value = "64", value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk: u64,
    /// Inbound backlog above which pending input is discarded.
    #[arg(long, default_value_t = DEFAULT_HIGH_WATER_MARK)]
    pub high_water_mark: usize,
    /// Messages kept per kind.
    #[arg(long, default_value_t = DEFAULT_STORE_CAPACITY)]
    pub capacity: usize,
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Payload bytes as hex, without magic, type tag or check byte.
    #[arg(default_value = "")]
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex input such as `21 32 00`, `213200` or `0x21,0x32`.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();
    hex::decode(&digits).map_err(|err| CliError::data_invalid(format!("invalid hex input: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_common_spellings() {
        let expected = vec![0x21, 0x32, 0x2B];
        assert_eq!(parse_hex("21 32 2B").unwrap(), expected);
        assert_eq!(parse_hex("21322b").unwrap(), expected);
        assert_eq!(parse_hex("0x21, 0x32, 0x2B").unwrap(), expected);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        let err = parse_hex("2G").unwrap_err();
        assert_eq!(err.code, crate::exit::DATA_INVALID);
        assert!(parse_hex("213").is_err());
    }
}
