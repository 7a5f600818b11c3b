use byteframe_parser::{ParseEvent, Parser, Status};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::config::ReaderConfig;
use crate::error::ReadError;
use crate::pump::{pump, Pumped};
use crate::reader::end_of_stream;

/// `tokio_util` decoder yielding one [`ParseEvent`] per terminal transition.
///
/// Use with `FramedRead` to drive a parser from any `AsyncRead`.
#[derive(Debug)]
pub struct MessageCodec {
    parser: Parser,
    config: ReaderConfig,
}

impl MessageCodec {
    pub fn new(parser: Parser) -> Self {
        Self::with_config(parser, ReaderConfig::default())
    }

    pub fn with_config(parser: Parser, config: ReaderConfig) -> Self {
        Self { parser, config }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    pub fn into_parser(self) -> Parser {
        self.parser
    }
}

impl Decoder for MessageCodec {
    type Item = ParseEvent;
    type Error = ReadError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (used, pumped) = pump(&mut self.parser, src, self.config.max_payload_size);
        src.advance(used);
        match pumped {
            Pumped::Event(event) => Ok(Some(event)),
            Pumped::NeedMore => Ok(None),
            Pumped::Overflow { size, max } => Err(ReadError::PayloadTooLarge { size, max }),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(event) => Ok(Some(event)),
            None => match self.parser.status() {
                Status::Idle => Ok(None),
                _ => Err(end_of_stream(&self.parser)),
            },
        }
    }
}
