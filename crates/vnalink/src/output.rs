use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vnalink_proto::{encode, Decoded, Record};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    index: u64,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Print one decoder outcome. `Raw` re-emits only the valid frames, so the
/// command works as a filter that strips noise and corrupt frames.
pub fn print_decoded(index: u64, decoded: &Decoded, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = match decoded {
                Ok(record) => DecodedOutput {
                    index,
                    status: "ok",
                    record: Some(record),
                    error: None,
                },
                Err(err) => DecodedOutput {
                    index,
                    status: "rejected",
                    record: None,
                    error: Some(err.to_string()),
                },
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let (status, kind, detail) = match decoded {
                Ok(record) => ("ok", record.kind().name(), record_detail(record)),
                Err(err) => ("rejected", "-", err.to_string()),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "STATUS", "KIND", "DETAIL"])
                .add_row(vec![
                    index.to_string(),
                    status.to_string(),
                    kind.to_string(),
                    detail,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match decoded {
            Ok(record) => println!(
                "#{index} ok kind={} {}",
                record.kind().name(),
                record_detail(record)
            ),
            Err(err) => println!("#{index} rejected: {err}"),
        },
        OutputFormat::Raw => {
            if let Ok(record) = decoded {
                print_raw(&encode(record));
            }
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'a str,
    length: usize,
    hex: String,
}

/// Print an encoded frame.
pub fn print_frame(record: &Record, frame: &[u8], format: OutputFormat) {
    let kind = record.kind().name();
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind,
                length: frame.len(),
                hex: to_hex(frame),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "LENGTH", "FRAME"])
                .add_row(vec![kind.to_string(), frame.len().to_string(), to_hex(frame)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("kind={kind} length={} frame={}", frame.len(), to_hex(frame));
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

/// One record of a firmware update sequence.
#[derive(Debug, Serialize)]
pub struct PlanStep {
    pub index: usize,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    /// Image bytes carried (the rest of a chunk is padding).
    pub data_len: usize,
    pub frame_len: usize,
}

#[derive(Debug, Serialize)]
pub struct Plan {
    pub image_len: usize,
    pub base_address: u32,
    pub chunks: usize,
    pub end_address: u64,
    pub encoded_len: usize,
    pub steps: Vec<PlanStep>,
}

/// Print a firmware update plan. `Raw` writes the encoded sequence itself.
pub fn print_plan(plan: &Plan, encoded: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(plan).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "ADDRESS", "DATA", "FRAME"]);
            for step in &plan.steps {
                table.add_row(vec![
                    step.index.to_string(),
                    step.kind.to_string(),
                    step.address
                        .map(|a| format!("{a:#010x}"))
                        .unwrap_or_else(|| "-".to_string()),
                    step.data_len.to_string(),
                    step.frame_len.to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "{} bytes in {} chunks, {} bytes on the wire",
                plan.image_len, plan.chunks, plan.encoded_len
            );
        }
        OutputFormat::Pretty => {
            println!(
                "image={} bytes base={:#010x} end={:#x} chunks={} wire={} bytes",
                plan.image_len, plan.base_address, plan.end_address, plan.chunks, plan.encoded_len
            );
            for step in &plan.steps {
                match step.address {
                    Some(address) => println!(
                        "  #{} {} @ {address:#010x} ({} bytes)",
                        step.index, step.kind, step.data_len
                    ),
                    None => println!("  #{} {}", step.index, step.kind),
                }
            }
        }
        OutputFormat::Raw => print_raw(encoded),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase hex, one space between bytes.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn record_detail(record: &Record) -> String {
    match record {
        Record::FirmwarePacket(packet) => {
            format!("address={:#010x} data={} bytes", packet.address, packet.data.len())
        }
        _ => serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string()),
    }
}
