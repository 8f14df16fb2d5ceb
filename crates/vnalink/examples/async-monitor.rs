//! Print every record (and every dropped frame) arriving on stdin.
//!
//! Run with:
//!   cat capture.bin | cargo run --example async-monitor --features async

use futures_util::StreamExt;
use tokio_util::codec::FramedRead;
use vnalink::proto::RecordCodec;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut frames = FramedRead::new(tokio::io::stdin(), RecordCodec::new());

    while let Some(item) = frames.next().await {
        match item? {
            Ok(record) => println!("{:>24}  {record:?}", record.kind().name()),
            Err(err) => eprintln!("dropped frame: {err}"),
        }
    }

    let stats = frames.decoder().decoder().stats();
    eprintln!("{} records, {} rejected", stats.records, stats.rejected());
    Ok(())
}
