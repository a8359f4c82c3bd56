use std::fs::File;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use netwire_connection::{connect_timeout, Connection};
use netwire_transport::Channel;
use tracing::debug;

use crate::cmd::SendArgs;
use crate::exit::{connection_error, io_error, wire_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

/// What goes on the wire.
#[derive(Debug, PartialEq)]
enum Payload {
    Packet(Vec<u8>),
    Text(String),
    File(PathBuf),
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let addr = resolve(&args.addr)?;
    let config = args.packet.connection_config().with_timeout(timeout);

    let mut conn = connect_timeout(&addr, timeout, &config)
        .map_err(|err| connection_error("connect failed", err))?;

    let payload = resolve_payload(&args);
    let sent = send_payload(&mut conn, &payload, config.wire.max_packet_size)?;
    debug!(%addr, sent, "payload sent");

    if args.wait {
        let reply = conn
            .read_packet()
            .map_err(|err| wire_error("receive failed", err))?;
        print_packet(&reply, addr, format);
    }

    Ok(SUCCESS)
}

fn resolve(addr: &str) -> CliResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|err| CliError::new(USAGE, format!("cannot resolve {addr}: {err}")))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("{addr} resolved to no addresses")))
}

fn resolve_payload(args: &SendArgs) -> Payload {
    if let Some(text) = &args.string {
        return Payload::Text(text.clone());
    }
    if let Some(path) = &args.file {
        return Payload::File(path.clone());
    }
    Payload::Packet(args.data.clone().unwrap_or_default().into_bytes())
}

/// Send `payload`, returning the payload size in bytes.
fn send_payload<C: Channel>(
    conn: &mut Connection<C>,
    payload: &Payload,
    max_packet_size: usize,
) -> CliResult<u64> {
    match payload {
        Payload::Packet(bytes) => {
            conn.write_packet(bytes)
                .map_err(|err| wire_error("send failed", err))?;
            Ok(bytes.len() as u64)
        }
        Payload::Text(text) => {
            conn.write_string(text)
                .map_err(|err| wire_error("send failed", err))?;
            Ok(text.len() as u64)
        }
        Payload::File(path) => {
            let context = format!("failed reading {}", path.display());
            let mut file = File::open(path).map_err(|err| io_error(&context, err))?;
            let len = file.metadata().map_err(|err| io_error(&context, err))?.len();

            let prefix = usize::try_from(len)
                .ok()
                .filter(|&n| n <= max_packet_size)
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| {
                    CliError::new(
                        DATA_INVALID,
                        format!("{} is {len} bytes, max packet is {max_packet_size}", path.display()),
                    )
                })?;

            conn.write_i32(prefix)
                .map_err(|err| wire_error("send failed", err))?;
            conn.write_from(&mut file, Some(len))
                .map_err(|err| wire_error("send failed", err))
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
