//! Parse results and the observer surface.
//!
//! Every terminal transition produces exactly one [`ParseEvent`]. The parser returns it from
//! [`Parser::feed`](crate::Parser::feed) and hands the same value to every registered
//! [`ParseObserver`] before returning.

use std::fmt;
use std::sync::mpsc;

use bytes::Bytes;

/// A completed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier of the descriptor that framed this message.
    pub id: u8,
    /// Payload snapshot. Bounded payloads include the end marker as their final byte.
    pub payload: Bytes,
}

impl Message {
    pub fn new(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// Classification of a feed-time error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Byte received while idle was not the start marker.
    Sync,
    /// Identifier byte matched no registered descriptor.
    MissingId,
    /// Transmitted checksum differs from the computed one.
    Checksum,
    /// Expected end marker was not received.
    MissingEom,
    /// The state machine held inconsistent state.
    Format,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Sync => "sync",
            ParseErrorKind::MissingId => "missing_id",
            ParseErrorKind::Checksum => "checksum",
            ParseErrorKind::MissingEom => "missing_eom",
            ParseErrorKind::Format => "format",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed-time error. The parser is back in `Idle` when this is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error{}", observed_suffix(.observed))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The byte that triggered a `Checksum`, `MissingEom` or `Format` error. `Sync` and
    /// `MissingId` carry none.
    pub observed: Option<u8>,
}

fn observed_suffix(observed: &Option<u8>) -> String {
    match observed {
        Some(byte) => format!(" (observed 0x{byte:02X})"),
        None => String::new(),
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, observed: Option<u8>) -> Self {
        Self { kind, observed }
    }
}

/// Terminal outcome of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    Completed(Message),
    Error(ParseError),
}

/// Result of feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// No terminal transition happened.
    Parsing,
    Completed(Message),
    Error(ParseError),
}

impl ParseResult {
    pub fn is_parsing(&self) -> bool {
        matches!(self, ParseResult::Parsing)
    }

    /// The terminal event, if any.
    pub fn into_event(self) -> Option<ParseEvent> {
        match self {
            ParseResult::Parsing => None,
            ParseResult::Completed(message) => Some(ParseEvent::Completed(message)),
            ParseResult::Error(error) => Some(ParseEvent::Error(error)),
        }
    }
}

impl From<ParseEvent> for ParseResult {
    fn from(event: ParseEvent) -> Self {
        match event {
            ParseEvent::Completed(message) => ParseResult::Completed(message),
            ParseEvent::Error(error) => ParseResult::Error(error),
        }
    }
}

/// Receives terminal events synchronously from inside [`Parser::feed`](crate::Parser::feed).
///
/// Both methods default to doing nothing so an observer can subscribe to one kind of event only.
pub trait ParseObserver {
    fn on_completed(&mut self, message: &Message) {
        let _ = message;
    }

    fn on_error(&mut self, error: &ParseError) {
        let _ = error;
    }
}

/// Forwards every event into a channel. A disconnected receiver is ignored.
impl ParseObserver for mpsc::Sender<ParseEvent> {
    fn on_completed(&mut self, message: &Message) {
        let _ = self.send(ParseEvent::Completed(message.clone()));
    }

    fn on_error(&mut self, error: &ParseError) {
        let _ = self.send(ParseEvent::Error(*error));
    }
}

pub(crate) struct CompletedFn<F>(pub(crate) F);

impl<F: FnMut(&Message)> ParseObserver for CompletedFn<F> {
    fn on_completed(&mut self, message: &Message) {
        (self.0)(message);
    }
}

pub(crate) struct ErrorFn<F>(pub(crate) F);

impl<F: FnMut(&ParseError)> ParseObserver for ErrorFn<F> {
    fn on_error(&mut self, error: &ParseError) {
        (self.0)(error);
    }
}

/// Observer fan-out owned by the parser.
#[derive(Default)]
pub(crate) struct Observers {
    inner: Vec<Box<dyn ParseObserver + Send>>,
}

impl Observers {
    pub(crate) fn push(&mut self, observer: Box<dyn ParseObserver + Send>) {
        self.inner.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn notify(&mut self, event: &ParseEvent) {
        match event {
            ParseEvent::Completed(message) => {
                for observer in &mut self.inner {
                    observer.on_completed(message);
                }
            }
            ParseEvent::Error(error) => {
                for observer in &mut self.inner {
                    observer.on_error(error);
                }
            }
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.inner.len())
            .finish()
    }
}
