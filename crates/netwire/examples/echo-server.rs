//! Minimal echo server: accepts one peer and echoes packets back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7070 --data hello --wait

use netwire::codec::ErrorKind;
use netwire::connection::ConnectionListener;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = ConnectionListener::bind("127.0.0.1:7070")?;
    eprintln!("Listening on {}", listener.local_addr());

    let (mut conn, peer) = listener.accept()?;
    eprintln!("Peer connected: {peer}");

    loop {
        match conn.read_packet() {
            Ok(packet) => {
                eprintln!("Received {} bytes", packet.len());
                conn.write_packet(&packet)?;
            }
            Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                eprintln!("Peer disconnected");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
