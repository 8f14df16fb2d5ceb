use vnalink_proto::{RecordKind, MAX_FRAME_LEN};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("vnalink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: vnalink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("VNALINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("VNALINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: firmware={}, async={}, cli=true",
        cfg!(feature = "firmware"),
        cfg!(feature = "async")
    );
    println!("record_kinds: {}", RecordKind::ALL.len());
    println!("max_frame_len: {MAX_FRAME_LEN}");

    Ok(SUCCESS)
}
