//! Typed reads and writes across real sockets.

#![allow(clippy::unwrap_used)]

use std::io::{Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use netwire_codec::{
    Decimal, ErrorKind, Guid, Link, TypedReader, TypedWriter, WireConfig, WireError,
};

fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

#[test]
fn int_bool_string_sequence_over_tcp() {
    let (client, server) = tcp_pair();

    let sender = thread::spawn(move || {
        let mut writer = TypedWriter::new(Link::new(client));
        writer.write_i32(5).unwrap();
        writer.write_bool(true).unwrap();
        writer.write_string("hi").unwrap();
    });

    let mut reader = TypedReader::new(Link::new(server));
    assert_eq!(reader.read_i32().unwrap(), 5);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_string().unwrap(), "hi");
    sender.join().unwrap();
}

#[test]
fn every_fixed_width_value_survives_the_trip() {
    let (client, server) = tcp_pair();
    let guid: Guid = "00112233-4455-6677-8899-aabbccddeeff".parse().unwrap();
    let decimal = Decimal::try_new(-12_345, 2).unwrap();

    let sender = thread::spawn(move || {
        let mut writer = TypedWriter::new(Link::new(client));
        writer.write_u8(0xab).unwrap();
        writer.write_i8(-7).unwrap();
        writer.write_u16(65_535).unwrap();
        writer.write_i16(-32_768).unwrap();
        writer.write_u32(4_000_000_000).unwrap();
        writer.write_i64(i64::MIN).unwrap();
        writer.write_u64(u64::MAX).unwrap();
        writer.write_f32(1.5).unwrap();
        writer.write_f64(-0.25).unwrap();
        writer.write_char('λ').unwrap();
        writer.write_guid(guid).unwrap();
        writer.write_decimal(decimal).unwrap();
        writer.write_duration(Duration::from_millis(1_500)).unwrap();
    });

    let mut reader = TypedReader::new(Link::new(server));
    assert_eq!(reader.read_u8().unwrap(), 0xab);
    assert_eq!(reader.read_i8().unwrap(), -7);
    assert_eq!(reader.read_u16().unwrap(), 65_535);
    assert_eq!(reader.read_i16().unwrap(), -32_768);
    assert_eq!(reader.read_u32().unwrap(), 4_000_000_000);
    assert_eq!(reader.read_i64().unwrap(), i64::MIN);
    assert_eq!(reader.read_u64().unwrap(), u64::MAX);
    assert_eq!(reader.read_f32().unwrap(), 1.5);
    assert_eq!(reader.read_f64().unwrap(), -0.25);
    assert_eq!(reader.read_char().unwrap(), 'λ');
    assert_eq!(reader.read_guid().unwrap(), guid);
    assert_eq!(reader.read_decimal().unwrap(), decimal);
    assert_eq!(reader.read_duration().unwrap(), Duration::from_millis(1_500));
    sender.join().unwrap();
}

#[test]
fn large_packet_crosses_many_segments() {
    let (client, server) = tcp_pair();
    let payload: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let sender = thread::spawn(move || {
        let mut writer = TypedWriter::new(Link::new(client));
        writer.write_packet(&payload).unwrap();
    });

    let mut reader = TypedReader::new(Link::new(server));
    assert_eq!(reader.read_packet().unwrap(), expected);
    sender.join().unwrap();
}

#[test]
fn peer_close_mid_packet_is_connection_reset() {
    let (mut client, server) = tcp_pair();
    client.write_all(&10i32.to_le_bytes()).unwrap();
    client.write_all(b"abc").unwrap();
    drop(client);

    let mut reader = TypedReader::new(Link::new(server));
    let err = reader.read_packet().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    assert!(!reader.is_connected());

    let err = reader.read_u8().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn oversized_prefix_rejected_without_teardown() {
    let (mut client, server) = tcp_pair();
    client.write_all(&1_000_000i32.to_le_bytes()).unwrap();

    let cfg = WireConfig {
        max_packet_size: 1024,
        ..WireConfig::default()
    };
    let mut reader = TypedReader::with_config(Link::new(server), cfg);
    let err = reader.read_packet().unwrap_err();
    assert!(matches!(
        err,
        WireError::LengthTooLarge {
            size: 1_000_000,
            max: 1024
        }
    ));
    assert!(reader.is_connected());
}

#[test]
fn stream_relay_between_sockets() {
    let (client, server) = tcp_pair();
    let body: Vec<u8> = (0..100_000u32).map(|i| i as u8).collect();
    let expected = body.clone();

    let sender = thread::spawn(move || {
        let mut writer = TypedWriter::new(Link::new(client));
        writer.write_i64(body.len() as i64).unwrap();
        let sent = writer
            .write_from(&mut Cursor::new(body), None)
            .unwrap();
        assert_eq!(sent, 100_000);
    });

    let mut reader = TypedReader::new(Link::new(server));
    let len = reader.read_i64().unwrap() as usize;
    let mut sink = Vec::new();
    reader.read_to(&mut sink, len).unwrap();
    assert_eq!(sink, expected);
    sender.join().unwrap();
}

#[cfg(unix)]
mod unix {
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn shared_link_reader_and_writer_on_one_socket() {
        let (local, remote) = UnixStream::pair().unwrap();

        let echo = thread::spawn(move || {
            let link = Link::new(remote);
            let mut reader = TypedReader::new(link.clone());
            let mut writer = TypedWriter::new(link);
            let text = reader.read_string().unwrap();
            writer.write_string(&text.to_uppercase()).unwrap();
        });

        let link = Link::new(local);
        let mut writer = TypedWriter::new(link.clone());
        let mut reader = TypedReader::new(link);
        writer.write_string("ping").unwrap();
        assert_eq!(reader.read_string().unwrap(), "PING");
        echo.join().unwrap();
    }

    #[test]
    fn disconnect_through_writer_releases_reader() {
        let (local, _remote) = UnixStream::pair().unwrap();
        let link = Link::new(local);
        let writer = TypedWriter::new(link.clone());
        let mut reader = TypedReader::new(link);

        writer.disconnect().unwrap();
        assert!(!reader.is_connected());
        assert_eq!(reader.read_u32().unwrap_err().kind(), ErrorKind::InvalidState);
        writer.disconnect().unwrap();
    }
}
