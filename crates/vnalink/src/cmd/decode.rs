use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use vnalink_proto::{ProtoError, RecordReader};

use crate::cmd::DecodeArgs;
use crate::exit::{
    io_error, proto_error, CliError, CliResult, DATA_INVALID, INTERNAL, INTERRUPTED, SUCCESS, USAGE,
};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = open_input(args.input.as_deref())?;
    if args.hex {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|err| io_error("failed reading hex input", err))?;
        input = Box::new(Cursor::new(parse_hex(&text)?));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut reader = RecordReader::new(input);
    let mut index = 0u64;
    let mut records = 0u64;

    while running.load(Ordering::SeqCst) {
        let decoded = match reader.next_decoded() {
            Ok(decoded) => decoded,
            Err(ProtoError::ConnectionClosed) => break,
            Err(err) => return Err(proto_error("read failed", err)),
        };

        print_decoded(index, &decoded, format);
        index += 1;
        if decoded.is_ok() {
            records += 1;
            if args.count.is_some_and(|count| records >= count) {
                break;
            }
        }
    }

    let stats = *reader.stats();
    info!(
        records = stats.records,
        rejected = stats.rejected(),
        checksum_mismatches = stats.checksum_mismatches,
        noise_bytes = stats.noise_bytes,
        "decode finished"
    );

    if args.strict && stats.rejected() > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} frame(s) rejected", stats.rejected()),
        ));
    }
    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(std::io::stdin())),
        Some(path) if path == Path::new("-") => Ok(Box::new(std::io::stdin())),
        Some(path) => File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read>)
            .map_err(|err| io_error(&format!("failed opening {}", path.display()), err)),
    }
}

/// Parse hex text such as `5a 07 4c`, `5A074C` or `0x5a, 0x07`.
fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| {
                    CliError::new(USAGE, format!("invalid hex byte at digit offset {i}"))
                })
        })
        .collect()
}

/// First Ctrl-C stops after the current read; a second one exits at once.
fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_common_layouts() {
        assert_eq!(parse_hex("5a 07 a5").unwrap(), vec![0x5A, 0x07, 0xA5]);
        assert_eq!(parse_hex("5A07A5\n").unwrap(), vec![0x5A, 0x07, 0xA5]);
        assert_eq!(parse_hex("0x5a, 0x07,0xa5").unwrap(), vec![0x5A, 0x07, 0xA5]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert_eq!(parse_hex("5a 0").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("zz").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("é5").unwrap_err().code, USAGE);
    }
}
