//! Property-based round trips over a local socket.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use std::os::unix::net::UnixStream;
use std::thread;

use bytes::BytesMut;
use netwire_codec::{
    decode_packet, encode_packet, Link, TypedReader, TypedWriter, DEFAULT_MAX_PACKET,
};
use proptest::prelude::*;

fn pair() -> (TypedWriter<UnixStream>, TypedReader<UnixStream>) {
    let (a, b) = UnixStream::pair().unwrap();
    (TypedWriter::new(Link::new(a)), TypedReader::new(Link::new(b)))
}

// Property: any string read back equals the string written
proptest! {
    #[test]
    fn prop_string_roundtrip(text in ".{0,2000}") {
        let (mut writer, mut reader) = pair();
        let sent = text.clone();
        let handle = thread::spawn(move || writer.write_string(&sent).unwrap());

        let received = reader.read_string().unwrap();
        handle.join().unwrap();
        prop_assert_eq!(received, text);
    }
}

// Property: any packet read back equals the packet written
proptest! {
    #[test]
    fn prop_packet_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..100_000)) {
        let (mut writer, mut reader) = pair();
        let sent = payload.clone();
        let handle = thread::spawn(move || writer.write_packet(&sent).unwrap());

        let received = reader.read_packet().unwrap();
        handle.join().unwrap();
        prop_assert_eq!(received, payload);
    }
}

// Property: the buffer codec and the socket writer agree byte for byte
proptest! {
    #[test]
    fn prop_buffer_codec_matches_wire(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let mut encoded = BytesMut::new();
        encode_packet(&payload, &mut encoded).unwrap();

        let (a, b) = UnixStream::pair().unwrap();
        let mut writer = TypedWriter::new(Link::new(a));
        let mut raw = TypedReader::new(Link::new(b));
        let sent = payload.clone();
        let handle = thread::spawn(move || writer.write_packet(&sent).unwrap());

        let mut wire = vec![0u8; encoded.len()];
        raw.read_bytes(&mut wire).unwrap();
        handle.join().unwrap();
        prop_assert_eq!(&wire[..], &encoded[..]);

        let decoded = decode_packet(&mut encoded, DEFAULT_MAX_PACKET).unwrap().unwrap();
        prop_assert_eq!(decoded.as_ref(), &payload[..]);
    }
}
