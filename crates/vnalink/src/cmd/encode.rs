use std::fs;
use std::io::Read;

use tracing::debug;
use vnalink_proto::{encode, Record};

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, json_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text = resolve_input(&args)?;
    let record = parse_record(&text)?;
    let frame = encode(&record);
    debug!(kind = %record.kind(), len = frame.len(), "encoded record");

    match &args.out {
        Some(path) => fs::write(path, &frame)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?,
        None => print_frame(&record, &frame, format),
    }

    Ok(SUCCESS)
}

fn resolve_input(args: &EncodeArgs) -> CliResult<String> {
    if let Some(json) = &args.json {
        return Ok(json.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(text)
}

fn parse_record(text: &str) -> CliResult<Record> {
    serde_json::from_str(text).map_err(|err| json_error("invalid record JSON", err))
}
