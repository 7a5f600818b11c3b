use std::io::{ErrorKind, Read};

use byteframe_parser::{Message, ParseEvent, Parser, Status};
use bytes::{Buf, BytesMut};
use tracing::warn;

use crate::config::ReaderConfig;
use crate::error::{ReadError, Result};
use crate::pump::{pump, Pumped};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads parse events from any `Read` source.
///
/// Bytes are pulled in chunks and fed to the parser one at a time; bytes after a terminal event
/// stay buffered for the next call. The configured payload limit bounds memory for unterminated
/// messages.
pub struct MessageReader<T> {
    inner: T,
    parser: Parser,
    buf: BytesMut,
    config: ReaderConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T, parser: Parser) -> Self {
        Self::with_config(inner, parser, ReaderConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, parser: Parser, config: ReaderConfig) -> Self {
        Self {
            inner,
            parser,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read until the next completed message or feed error (blocking).
    ///
    /// Returns `Err(ReadError::EndOfStream)` when the source is exhausted between messages and
    /// `Err(ReadError::Truncated)` when it ends inside one.
    pub fn read_event(&mut self) -> Result<ParseEvent> {
        loop {
            if !self.buf.is_empty() {
                let (used, pumped) =
                    pump(&mut self.parser, &self.buf, self.config.max_payload_size);
                self.buf.advance(used);
                match pumped {
                    Pumped::Event(event) => return Ok(event),
                    Pumped::Overflow { size, max } => {
                        return Err(ReadError::PayloadTooLarge { size, max })
                    }
                    Pumped::NeedMore => {}
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ReadError::Io(err)),
            };

            if read == 0 {
                return Err(end_of_stream(&self.parser));
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read until the next completed message, logging and skipping feed errors.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            match self.read_event()? {
                ParseEvent::Completed(message) => return Ok(message),
                ParseEvent::Error(err) => warn!(error = %err, "skipping malformed input"),
            }
        }
    }

    /// Iterate over events until the source is exhausted.
    ///
    /// A clean end of stream ends iteration. An end of stream in the middle of a message, even
    /// one that stopped right after its start marker, is yielded once as an error.
    pub fn events(&mut self) -> Events<'_, T> {
        Events {
            reader: self,
            done: false,
        }
    }

    /// Borrow the parser, e.g. to inspect its status.
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Mutably borrow the parser, e.g. to subscribe observers.
    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the source and parser.
    pub fn into_parts(self) -> (T, Parser) {
        (self.inner, self.parser)
    }

    /// Update the payload limit for subsequent reads.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

/// Classify end of input by parser state; any state but idle is an unfinished message.
pub(crate) fn end_of_stream(parser: &Parser) -> ReadError {
    match parser.status() {
        Status::Idle => ReadError::EndOfStream,
        status => ReadError::Truncated {
            status,
            pending: parser.pending_len(),
        },
    }
}

/// Iterator returned by [`MessageReader::events`].
pub struct Events<'a, T> {
    reader: &'a mut MessageReader<T>,
    done: bool,
}

impl<T: Read> Iterator for Events<'_, T> {
    type Item = Result<ParseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_event() {
            Ok(event) => Some(Ok(event)),
            Err(ReadError::EndOfStream) => {
                self.done = true;
                None
            }
            Err(err @ ReadError::Truncated { .. }) | Err(err @ ReadError::Io(_)) => {
                self.done = true;
                Some(Err(err))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use byteframe_parser::{
        encode_message, DescriptorTable, Framing, Markers, ParseError, ParseErrorKind, Status,
    };

    use super::*;

    const MARKERS: Markers = Markers {
        start: 0x7E,
        end: 0x7F,
    };

    fn table() -> DescriptorTable {
        DescriptorTable::new()
            .with(0x01, Framing::Sized(2), true)
            .and_then(|t| t.with(0x02, Framing::Bounded, false))
            .unwrap()
    }

    fn parser() -> Parser {
        Parser::new(MARKERS, table())
    }

    fn wire(messages: &[(u8, &[u8])]) -> Vec<u8> {
        let table = table();
        let mut buf = BytesMut::new();
        for (id, data) in messages {
            let descriptor = table.lookup(*id).unwrap();
            encode_message(MARKERS, descriptor, data, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_message() {
        let bytes = wire(&[(0x01, &[0x10, 0x20])]);
        let mut reader = MessageReader::new(Cursor::new(bytes), parser());

        let message = reader.read_message().unwrap();
        assert_eq!(message, Message::new(0x01, vec![0x10, 0x20]));
    }

    #[test]
    fn read_multiple_messages() {
        let bytes = wire(&[(0x01, &[1, 2]), (0x02, b"hello"), (0x01, &[3, 4])]);
        let mut reader = MessageReader::new(Cursor::new(bytes), parser());

        let m1 = reader.read_message().unwrap();
        let m2 = reader.read_message().unwrap();
        let m3 = reader.read_message().unwrap();

        assert_eq!((m1.id, m1.payload.as_ref()), (0x01, [1u8, 2].as_ref()));
        assert_eq!((m2.id, m2.payload.as_ref()), (0x02, b"hello\x7F".as_ref()));
        assert_eq!((m3.id, m3.payload.as_ref()), (0x01, [3u8, 4].as_ref()));
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[(0x02, b"slow")]);
        let byte_reader = ByteByByteReader { bytes, pos: 0 };
        let mut reader = MessageReader::new(byte_reader, parser());

        let message = reader.read_message().unwrap();
        assert_eq!(message.payload.as_ref(), b"slow\x7F");
    }

    #[test]
    fn read_event_reports_feed_errors() {
        let mut bytes = vec![0x00, 0x7E, 0x09];
        bytes.extend(wire(&[(0x01, &[5, 6])]));
        let mut reader = MessageReader::new(Cursor::new(bytes), parser());

        assert_eq!(
            reader.read_event().unwrap(),
            ParseEvent::Error(ParseError::new(ParseErrorKind::Sync, None))
        );
        assert_eq!(
            reader.read_event().unwrap(),
            ParseEvent::Error(ParseError::new(ParseErrorKind::MissingId, None))
        );
        assert_eq!(
            reader.read_event().unwrap(),
            ParseEvent::Completed(Message::new(0x01, vec![5, 6]))
        );
    }

    #[test]
    fn read_message_skips_garbage() {
        let mut bytes = vec![0xAA, 0xBB, 0x7E, 0x01, 0x01, 0x01, 0x00];
        bytes.extend(wire(&[(0x02, b"ok")]));
        let mut reader = MessageReader::new(Cursor::new(bytes), parser());

        let message = reader.read_message().unwrap();
        assert_eq!(message, Message::new(0x02, b"ok\x7F".to_vec()));
    }

    #[test]
    fn end_of_stream_cleanly() {
        let mut reader = MessageReader::new(Cursor::new(Vec::<u8>::new()), parser());
        let err = reader.read_event().unwrap_err();
        assert!(matches!(err, ReadError::EndOfStream));
    }

    #[test]
    fn end_of_stream_mid_message() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x7E, 0x02, 1, 2, 3]), parser());
        let err = reader.read_event().unwrap_err();
        assert!(matches!(
            err,
            ReadError::Truncated {
                status: Status::WaitData,
                pending: 3
            }
        ));
        assert_eq!(reader.parser().status(), Status::WaitData);
    }

    #[test]
    fn end_of_stream_after_start_marker_is_truncated() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x7E]), parser());
        let err = reader.read_event().unwrap_err();
        assert!(matches!(
            err,
            ReadError::Truncated {
                status: Status::WaitId,
                pending: 0
            }
        ));
    }

    #[test]
    fn end_of_stream_after_identifier_is_truncated() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x7E, 0x01]), parser());
        let err = reader.read_event().unwrap_err();
        assert!(matches!(
            err,
            ReadError::Truncated {
                status: Status::WaitData,
                pending: 0
            }
        ));
    }

    #[test]
    fn end_of_stream_after_garbage_is_clean() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x00, 0x01]), parser());
        let items: Vec<Result<ParseEvent>> = reader.events().collect();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| matches!(item, Ok(ParseEvent::Error(_)))));
    }

    #[test]
    fn unterminated_message_hits_limit() {
        let mut bytes = vec![0x7E, 0x02];
        bytes.extend(std::iter::repeat(0x41).take(64));
        bytes.extend(wire(&[(0x01, &[7, 8])]));

        let cfg = ReaderConfig {
            max_payload_size: 16,
        };
        let mut reader = MessageReader::with_config(Cursor::new(bytes), parser(), cfg);

        let err = reader.read_event().unwrap_err();
        assert!(matches!(err, ReadError::PayloadTooLarge { size: 17, max: 16 }));
        assert_eq!(reader.parser().status(), Status::Idle);

        // The rest of the oversized body is garbage; the next framed message still arrives.
        let message = reader.read_message().unwrap();
        assert_eq!(message, Message::new(0x01, vec![7, 8]));
    }

    #[test]
    fn events_iterator_stops_at_clean_end() {
        let bytes = wire(&[(0x01, &[1, 1]), (0x02, b"x")]);
        let mut reader = MessageReader::new(Cursor::new(bytes), parser());

        let events: Vec<ParseEvent> = reader.events().map(|e| e.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                ParseEvent::Completed(Message::new(0x01, vec![1, 1])),
                ParseEvent::Completed(Message::new(0x02, b"x\x7F".to_vec())),
            ]
        );
    }

    #[test]
    fn events_iterator_reports_truncated_tail() {
        let mut reader = MessageReader::new(Cursor::new(vec![0x7E, 0x01, 0x05]), parser());
        let items: Vec<Result<ParseEvent>> = reader.events().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(ReadError::Truncated {
                status: Status::WaitData,
                pending: 1
            })
        ));
    }

    #[test]
    fn events_iterator_reports_bare_start_marker() {
        for tail in [vec![0x7E], vec![0x7E, 0x01]] {
            let mut bytes = wire(&[(0x01, &[2, 2])]);
            bytes.extend(tail);
            let mut reader = MessageReader::new(Cursor::new(bytes), parser());

            let items: Vec<Result<ParseEvent>> = reader.events().collect();
            assert_eq!(items.len(), 2);
            assert!(matches!(items[0], Ok(ParseEvent::Completed(_))));
            assert!(matches!(items[1], Err(ReadError::Truncated { pending: 0, .. })));
        }
    }

    #[test]
    fn observers_fire_through_reader() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut p = parser();
        p.on_completed(move |m| sink.lock().unwrap().push(m.id));

        let bytes = wire(&[(0x02, b"a"), (0x01, &[0, 0])]);
        let mut reader = MessageReader::new(Cursor::new(bytes), p);
        while reader.read_message().is_ok() {}

        assert_eq!(*seen.lock().unwrap(), vec![0x02, 0x01]);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(&[(0x01, &[9, 9])]),
            pos: 0,
        };
        let mut reader = MessageReader::new(reader, parser());
        let message = reader.read_message().unwrap();
        assert_eq!(message, Message::new(0x01, vec![9, 9]));
    }

    #[test]
    fn would_block_propagates_io_error() {
        let reader = WouldBlock;
        let mut reader = MessageReader::new(reader, parser());
        let err = reader.read_event().unwrap_err();
        assert!(matches!(err, ReadError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        use std::io::Write;

        let (mut left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut reader = MessageReader::new(right, parser());

        left.write_all(&wire(&[(0x02, b"ping")])).unwrap();
        let message = reader.read_message().unwrap();
        assert_eq!(message.payload.as_ref(), b"ping\x7F");
    }

    #[test]
    fn accessors_and_into_parts() {
        let mut reader = MessageReader::new(Cursor::new(Vec::<u8>::new()), parser());
        reader.set_max_payload_size(8);
        assert_eq!(reader.config().max_payload_size, 8);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        reader.parser_mut().reset();
        let (_inner, parser) = reader.into_parts();
        assert_eq!(parser.table().len(), 2);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct WouldBlock;

    impl Read for WouldBlock {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
