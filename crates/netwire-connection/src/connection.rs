use std::io::{Read, Write};
use std::time::Duration;

use netwire_codec::{
    AttachError, Decimal, Guid, Link, Result, TypedReader, TypedWriter, WireConfig, WireValue,
};
use netwire_transport::Channel;
use tracing::debug;

/// A typed reader and a typed writer over one channel.
///
/// Both halves share the channel through a single [`Link`], so a transport
/// fault seen by either side releases the channel for both. Dropping the
/// connection shuts the channel down.
///
/// One thread may read while another writes once the connection is
/// [`split`](Connection::split). Concurrent calls in the same direction
/// must be serialized by the caller.
pub struct Connection<C: Channel> {
    reader: TypedReader<C>,
    writer: TypedWriter<C>,
}

impl<C: Channel> Connection<C> {
    /// Wrap a connected channel.
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, WireConfig::default())
    }

    /// Wrap a connected channel with explicit wire configuration.
    pub fn with_config(channel: C, config: WireConfig) -> Self {
        Self::from_link(Link::new(channel), config)
    }

    /// A connection whose channel has not been assigned yet.
    ///
    /// Every operation fails with an invalid-state error until
    /// [`attach`](Connection::attach) succeeds.
    pub fn detached() -> Self {
        Self::detached_with_config(WireConfig::default())
    }

    /// A detached connection with explicit wire configuration.
    pub fn detached_with_config(config: WireConfig) -> Self {
        Self::from_link(Link::detached(), config)
    }

    fn from_link(link: Link<C>, config: WireConfig) -> Self {
        Self {
            reader: TypedReader::with_config(link.clone(), config.clone()),
            writer: TypedWriter::with_config(link, config),
        }
    }

    /// Assign the channel of a detached connection.
    ///
    /// A refused channel comes back inside the error, still open.
    pub fn attach(&self, channel: C) -> std::result::Result<(), AttachError<C>> {
        self.reader.link().attach(channel)
    }

    /// Whether the channel is open and still reports a peer.
    pub fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }

    /// Shut down and release the channel.
    ///
    /// Calling this again is a no-op. A connection that never had a channel
    /// reports an invalid-state error.
    pub fn disconnect(&self) -> Result<()> {
        self.reader.disconnect()
    }

    /// Update the packet and string bound for both directions.
    pub fn set_max_packet_size(&mut self, max_packet_size: usize) {
        self.reader.set_max_packet_size(max_packet_size);
        self.writer.set_max_packet_size(max_packet_size);
    }

    /// The reading half.
    pub fn reader(&mut self) -> &mut TypedReader<C> {
        &mut self.reader
    }

    /// The writing half.
    pub fn writer(&mut self) -> &mut TypedWriter<C> {
        &mut self.writer
    }

    /// Separate the halves so they can be driven from different threads.
    ///
    /// The halves keep sharing the channel: a fault on one side still
    /// releases it for the other. The channel closes once both are dropped
    /// or either one disconnects.
    pub fn split(mut self) -> (TypedReader<C>, TypedWriter<C>) {
        let config = self.reader.config().clone();
        let reader = std::mem::replace(
            &mut self.reader,
            TypedReader::with_config(Link::detached(), config.clone()),
        );
        let writer = std::mem::replace(
            &mut self.writer,
            TypedWriter::with_config(Link::detached(), config),
        );
        (reader, writer)
    }

    pub fn read_value<T: WireValue>(&mut self) -> Result<T> {
        self.reader.read_value()
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.reader.read_bool()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.reader.read_u8()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.reader.read_i8()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.reader.read_u16()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.reader.read_i16()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.reader.read_u32()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.reader.read_i32()
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.reader.read_u64()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.reader.read_i64()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.reader.read_f32()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.reader.read_f64()
    }

    pub fn read_utf16(&mut self) -> Result<u16> {
        self.reader.read_utf16()
    }

    pub fn read_char(&mut self) -> Result<char> {
        self.reader.read_char()
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        self.reader.read_guid()
    }

    pub fn read_decimal(&mut self) -> Result<Decimal> {
        self.reader.read_decimal()
    }

    pub fn read_duration(&mut self) -> Result<Duration> {
        self.reader.read_duration()
    }

    pub fn read_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        self.reader.read_bytes(dest)
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.reader.read_string()
    }

    /// A rejected length prefix leaves its payload unread; see
    /// [`TypedReader::read_packet`].
    pub fn read_packet(&mut self) -> Result<Vec<u8>> {
        self.reader.read_packet()
    }

    pub fn read_packet_into(&mut self, dest: &mut Vec<u8>) -> Result<usize> {
        self.reader.read_packet_into(dest)
    }

    pub fn read_to<W: Write + ?Sized>(&mut self, sink: &mut W, len: usize) -> Result<()> {
        self.reader.read_to(sink, len)
    }

    pub fn write_value<T: WireValue>(&mut self, value: &T) -> Result<()> {
        self.writer.write_value(value)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.writer.write_bool(value)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.writer.write_i8(value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16(value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.writer.write_i16(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32(value)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64(value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.writer.write_i64(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32(value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.writer.write_f64(value)
    }

    pub fn write_utf16(&mut self, unit: u16) -> Result<()> {
        self.writer.write_utf16(unit)
    }

    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.writer.write_char(value)
    }

    pub fn write_guid(&mut self, value: Guid) -> Result<()> {
        self.writer.write_guid(value)
    }

    pub fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        self.writer.write_decimal(value)
    }

    pub fn write_duration(&mut self, value: Duration) -> Result<()> {
        self.writer.write_duration(value)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_bytes(bytes)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.writer.write_string(value)
    }

    pub fn write_packet(&mut self, payload: &[u8]) -> Result<()> {
        self.writer.write_packet(payload)
    }

    pub fn write_from<R: Read + ?Sized>(&mut self, source: &mut R, len: Option<u64>) -> Result<u64> {
        self.writer.write_from(source, len)
    }
}

impl<C: Channel> Drop for Connection<C> {
    fn drop(&mut self) {
        let released = self.reader.link().teardown() | self.writer.link().teardown();
        if released {
            debug!("connection dropped, channel released");
        }
    }
}

impl<C: Channel> std::fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("reader", &self.reader)
            .field("writer", &self.writer)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use netwire_codec::{ErrorKind, WireError};

    use super::*;

    /// Unix socket that counts shutdown calls.
    struct Counted {
        stream: UnixStream,
        shutdowns: Arc<AtomicUsize>,
    }

    impl Counted {
        fn new(stream: UnixStream) -> (Self, Arc<AtomicUsize>) {
            let shutdowns = Arc::new(AtomicUsize::new(0));
            let counted = Self {
                stream,
                shutdowns: Arc::clone(&shutdowns),
            };
            (counted, shutdowns)
        }
    }

    impl Channel for Counted {
        fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
            self.stream.send_some(buf)
        }

        fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
            self.stream.receive_some(buf)
        }

        fn shutdown(&self) -> io::Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Channel::shutdown(&self.stream)
        }

        fn is_connected(&self) -> bool {
            self.shutdowns.load(Ordering::SeqCst) == 0
        }
    }

    fn pair() -> (Connection<UnixStream>, Connection<UnixStream>) {
        let (a, b) = UnixStream::pair().unwrap();
        (Connection::new(a), Connection::new(b))
    }

    #[test]
    fn typed_roundtrip_between_connections() {
        let (mut left, mut right) = pair();

        left.write_i32(5).unwrap();
        left.write_bool(true).unwrap();
        left.write_string("hi").unwrap();
        left.write_packet(&[1, 2, 3]).unwrap();
        left.write_guid(Guid::from_u128(7)).unwrap();

        assert_eq!(right.read_i32().unwrap(), 5);
        assert!(right.read_bool().unwrap());
        assert_eq!(right.read_string().unwrap(), "hi");
        assert_eq!(right.read_packet().unwrap(), vec![1, 2, 3]);
        assert_eq!(right.read_guid().unwrap(), Guid::from_u128(7));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (a, _b) = UnixStream::pair().unwrap();
        let (channel, shutdowns) = Counted::new(a);
        let conn = Connection::new(channel);

        assert!(conn.is_connected());
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert!(!conn.is_connected());
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_channel_once() {
        let (a, _b) = UnixStream::pair().unwrap();
        let (channel, shutdowns) = Counted::new(a);
        let conn = Connection::new(channel);
        conn.disconnect().unwrap();
        drop(conn);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_signals_end_of_stream_to_peer() {
        let (left, mut right) = pair();
        drop(left);

        let err = right.read_u8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
        assert!(!right.is_connected());
    }

    #[test]
    fn detached_connection_is_invalid_until_attached() {
        let mut conn: Connection<UnixStream> = Connection::detached();
        assert!(!conn.is_connected());

        let err = conn.disconnect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = conn.write_u32(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let (a, b) = UnixStream::pair().unwrap();
        conn.attach(a).unwrap();
        assert!(conn.is_connected());

        let refused = conn.attach(b).unwrap_err();
        assert!(matches!(refused.error(), WireError::AlreadyAttached));
        let mut peer = Connection::new(refused.into_channel());

        conn.write_u32(1).unwrap();
        assert_eq!(peer.read_u32().unwrap(), 1);
    }

    #[test]
    fn attach_after_disconnect_is_refused() {
        let (a, b) = UnixStream::pair().unwrap();
        let conn = Connection::new(a);
        conn.disconnect().unwrap();

        let (err, b) = conn.attach(b).unwrap_err().into_parts();
        assert!(matches!(err, WireError::Released));
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let mut leftover = Connection::new(b);
        let err = leftover.read_u8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[test]
    fn refused_channel_keeps_its_peer_alive() {
        let (a, _a_peer) = UnixStream::pair().unwrap();
        let (b, b_peer) = UnixStream::pair().unwrap();
        let (counted, shutdowns) = Counted::new(b);
        let conn = Connection::new(Counted::new(a).0);

        let returned = conn.attach(counted).unwrap_err().into_channel();
        assert_eq!(shutdowns.load(Ordering::SeqCst), 0);

        let mut sender = Connection::new(returned);
        let mut receiver = Connection::new(Counted::new(b_peer).0);
        sender.write_i64(-7).unwrap();
        assert_eq!(receiver.read_i64().unwrap(), -7);
    }

    #[test]
    fn malformed_payload_keeps_connection_usable() {
        let (mut left, mut right) = pair();
        left.write_i32(2).unwrap();
        left.write_bytes(&[0xc3, 0x28]).unwrap();
        left.write_string("ok").unwrap();

        let err = right.read_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
        assert!(right.is_connected());
        assert_eq!(right.read_string().unwrap(), "ok");
    }

    #[test]
    fn packet_bound_applies_to_both_directions() {
        let (mut left, mut right) = pair();
        left.set_max_packet_size(4);
        right.set_max_packet_size(4);

        let err = left.write_packet(b"too long").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingFailure);

        left.write_i32(5).unwrap();
        let err = right.read_packet().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
        assert!(right.is_connected());
    }

    #[test]
    fn split_halves_run_on_separate_threads() {
        let (left, right) = pair();
        let (mut reader, mut writer) = left.split();

        let echo = thread::spawn(move || {
            let mut right = right;
            for _ in 0..3 {
                let packet = right.read_packet().unwrap();
                right.write_packet(&packet).unwrap();
            }
        });

        let sender = thread::spawn(move || {
            for word in ["one", "two", "three"] {
                writer.write_packet(word.as_bytes()).unwrap();
            }
            writer
        });

        let mut echoed = Vec::new();
        for _ in 0..3 {
            echoed.push(String::from_utf8(reader.read_packet().unwrap()).unwrap());
        }
        assert_eq!(echoed, ["one", "two", "three"]);

        sender.join().unwrap();
        echo.join().unwrap();
    }

    #[test]
    fn split_does_not_close_channel() {
        let (a, _b) = UnixStream::pair().unwrap();
        let (channel, shutdowns) = Counted::new(a);
        let (reader, writer) = Connection::new(channel).split();

        assert_eq!(shutdowns.load(Ordering::SeqCst), 0);
        assert!(reader.is_connected());

        writer.disconnect().unwrap();
        assert!(!reader.is_connected());
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stream_relay_through_connection() {
        let (mut left, mut right) = pair();
        let body = b"relayed through the facade".to_vec();

        let sent = left
            .write_from(&mut io::Cursor::new(body.clone()), Some(body.len() as u64))
            .unwrap();
        assert_eq!(sent, body.len() as u64);

        let mut sink = Vec::new();
        right.read_to(&mut sink, body.len()).unwrap();
        assert_eq!(sink, body);
    }
}
