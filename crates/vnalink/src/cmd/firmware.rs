use std::fs;

use tracing::info;
use vnalink_firmware::{chunk_count, update_sequence};
use vnalink_proto::{encode, Record, FIRMWARE_CHUNK_SIZE};

use crate::cmd::PlanArgs;
use crate::exit::{chunk_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_plan, OutputFormat, Plan, PlanStep};

pub fn plan(args: PlanArgs, format: OutputFormat) -> CliResult<i32> {
    let image = fs::read(&args.image)
        .map_err(|err| io_error(&format!("failed reading {}", args.image.display()), err))?;
    if image.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} is empty", args.image.display()),
        ));
    }

    let (plan, encoded) = build_plan(&image, args.base_address)?;
    info!(
        chunks = plan.chunks,
        wire_bytes = plan.encoded_len,
        "planned firmware update"
    );

    if let Some(path) = &args.emit {
        fs::write(path, &encoded)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    }
    print_plan(&plan, &encoded, format);

    Ok(SUCCESS)
}

fn build_plan(image: &[u8], base_address: u32) -> CliResult<(Plan, Vec<u8>)> {
    let sequence =
        update_sequence(image, base_address).map_err(|err| chunk_error("cannot plan image", err))?;

    let mut encoded = Vec::new();
    let mut steps = Vec::with_capacity(sequence.len());
    let mut remaining = image.len();
    for (index, record) in sequence.iter().enumerate() {
        let frame = encode(record);
        encoded.extend_from_slice(&frame);

        let (address, data_len) = match record {
            Record::FirmwarePacket(packet) => {
                let used = remaining.min(FIRMWARE_CHUNK_SIZE);
                remaining -= used;
                (Some(packet.address), used)
            }
            _ => (None, 0),
        };
        steps.push(PlanStep {
            index,
            kind: record.kind().name(),
            address,
            data_len,
            frame_len: frame.len(),
        });
    }

    let chunks = chunk_count(image.len());
    let plan = Plan {
        image_len: image.len(),
        base_address,
        chunks,
        end_address: u64::from(base_address) + (chunks * FIRMWARE_CHUNK_SIZE) as u64,
        encoded_len: encoded.len(),
        steps,
    };
    Ok((plan, encoded))
}
