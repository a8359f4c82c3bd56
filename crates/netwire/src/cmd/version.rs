use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("netwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: netwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("NETWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("max_packet_default: {}", netwire_codec::DEFAULT_MAX_PACKET);
    println!("relay_chunk_default: {}", netwire_codec::DEFAULT_RELAY_CHUNK);
    println!(
        "features: connection={}, cli=true",
        cfg!(feature = "connection")
    );

    Ok(SUCCESS)
}
