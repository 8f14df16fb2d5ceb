//! Flash a firmware image over an already-configured serial device.
//!
//! Run with:
//!   stty -F /dev/ttyACM0 raw 115200 min 0 time 20
//!   cargo run --example flash-image -- /dev/ttyACM0 firmware.bin 0x08004000
//!
//! The `time 20` setting makes reads return after two seconds of silence,
//! which the updater treats as a missing reply.

use std::fs::{self, OpenOptions};

use vnalink::firmware::{FirmwareUpdater, Stage, StreamLink, UpdateConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(device), Some(image_path)) = (args.next(), args.next()) else {
        eprintln!("usage: flash-image <DEVICE> <IMAGE> [BASE_ADDRESS]");
        std::process::exit(64);
    };
    let base_address = match args.next() {
        Some(text) => match text.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16)?,
            None => text.parse()?,
        },
        None => 0,
    };

    let image = fs::read(&image_path)?;
    let port = OpenOptions::new().read(true).write(true).open(&device)?;
    let link = StreamLink::new(port.try_clone()?, port);

    let config = UpdateConfig {
        base_address,
        ..UpdateConfig::default()
    };
    let mut updater = FirmwareUpdater::with_config(link, config);
    let report = updater.run_with_progress(&image, |progress| match progress.stage {
        Stage::Writing if progress.chunks_sent > 0 => {
            eprint!("\rchunk {}/{}", progress.chunks_sent, progress.chunks_total);
        }
        Stage::Applying => eprintln!("\napplying update"),
        _ => {}
    })?;

    eprintln!(
        "done: {} chunks, {} resends",
        report.chunks, report.retries
    );
    Ok(())
}
