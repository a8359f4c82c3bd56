use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use netwire_codec::{ErrorKind, WireError};
use netwire_connection::{Connection, ConnectionListener};
use netwire_transport::Channel;
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, EchoArgs};
use crate::exit::{connection_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let listener =
        ConnectionListener::bind_with_config(args.addr.as_str(), args.packet.connection_config())
            .map_err(|err| connection_error("bind failed", err))?;
    info!(addr = %listener.local_addr(), "echo server listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut served = 0usize;

    while running.load(Ordering::SeqCst) {
        let (mut conn, peer) = listener
            .accept()
            .map_err(|err| connection_error("accept failed", err))?;

        match echo_session(&mut conn, &running) {
            Ok(echoed) => debug!(%peer, echoed, "peer disconnected"),
            Err(err) => warn!(%peer, error = %err, "dropping connection"),
        }

        served = served.saturating_add(1);
        if args.connections.is_some_and(|limit| served >= limit) {
            break;
        }
    }

    Ok(SUCCESS)
}

/// Echo packets until the peer disconnects, returning how many were echoed.
fn echo_session<C: Channel>(
    conn: &mut Connection<C>,
    running: &AtomicBool,
) -> Result<usize, WireError> {
    let mut buf = Vec::new();
    let mut echoed = 0usize;

    while running.load(Ordering::SeqCst) {
        let len = match conn.read_packet_into(&mut buf) {
            Ok(len) => len,
            Err(err) if err.kind() == ErrorKind::ConnectionReset => break,
            Err(err) => return Err(err),
        };

        info!(size = len, "echoing packet");
        conn.write_packet(&buf[..len])?;
        echoed += 1;
    }

    Ok(echoed)
}
