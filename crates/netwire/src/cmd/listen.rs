use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use netwire_codec::{ErrorKind, WireError};
use netwire_connection::{Connection, ConnectionListener};
use netwire_transport::Channel;
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{connection_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        ConnectionListener::bind_with_config(args.addr.as_str(), args.packet.connection_config())
            .map_err(|err| connection_error("bind failed", err))?;
    info!(addr = %listener.local_addr(), "listening for packets");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut remaining = args.count;

    while running.load(Ordering::SeqCst) && remaining != Some(0) {
        let (mut conn, peer) = listener
            .accept()
            .map_err(|err| connection_error("accept failed", err))?;

        let outcome = drain(&mut conn, &running, &mut remaining, |packet| {
            print_packet(packet, peer, format);
        });
        log_session_end(peer, outcome);
    }

    Ok(SUCCESS)
}

/// Read packets until the peer leaves, `remaining` hits zero or a
/// shutdown is requested.
fn drain<C, F>(
    conn: &mut Connection<C>,
    running: &AtomicBool,
    remaining: &mut Option<usize>,
    mut on_packet: F,
) -> Result<(), WireError>
where
    C: Channel,
    F: FnMut(&[u8]),
{
    let mut buf = Vec::new();
    while running.load(Ordering::SeqCst) && *remaining != Some(0) {
        let len = conn.read_packet_into(&mut buf)?;
        on_packet(&buf[..len]);
        if let Some(left) = remaining.as_mut() {
            *left -= 1;
        }
    }
    Ok(())
}

fn log_session_end(peer: SocketAddr, outcome: Result<(), WireError>) {
    match outcome {
        Ok(()) => debug!(%peer, "session finished"),
        Err(err) if err.kind() == ErrorKind::ConnectionReset => debug!(%peer, "peer disconnected"),
        Err(err) => warn!(%peer, error = %err, "dropping connection"),
    }
}
