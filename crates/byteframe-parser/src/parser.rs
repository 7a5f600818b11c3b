use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::checksum::Checksum;
use crate::descriptor::{Descriptor, DescriptorTable, Framing};
use crate::event::{
    CompletedFn, ErrorFn, Message, Observers, ParseError, ParseErrorKind, ParseEvent,
    ParseObserver, ParseResult,
};

/// End marker used when none is configured.
pub const DEFAULT_END_MARKER: u8 = 0x00;

const INITIAL_PAYLOAD_CAPACITY: usize = 256;

/// Start and end marker bytes shared by every message kind on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Markers {
    pub start: u8,
    pub end: u8,
}

impl Markers {
    /// Markers with the given start byte and the default end marker.
    pub fn new(start: u8) -> Self {
        Self {
            start,
            end: DEFAULT_END_MARKER,
        }
    }

    pub fn with_end(mut self, end: u8) -> Self {
        self.end = end;
        self
    }
}

/// Observable name of the current parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Idle,
    WaitId,
    WaitData,
    WaitCheckSum,
    WaitEoM,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Idle => "idle",
            Status::WaitId => "wait_id",
            Status::WaitData => "wait_data",
            Status::WaitCheckSum => "wait_checksum",
            Status::WaitEoM => "wait_eom",
        };
        f.write_str(name)
    }
}

/// Machine state. Each variant carries exactly the data valid while in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    WaitId,
    WaitData {
        descriptor: Descriptor,
        remaining: usize,
        checksum: Checksum,
    },
    WaitCheckSum {
        descriptor: Descriptor,
        checksum: Checksum,
    },
    WaitEoM {
        descriptor: Descriptor,
    },
}

/// Byte-at-a-time framing parser.
///
/// Each call to [`feed`](Self::feed) performs exactly one state transition. Terminal transitions
/// return [`ParseResult::Completed`] or [`ParseResult::Error`] and are delivered to every
/// subscribed observer before `feed` returns. After any terminal transition the parser is idle
/// and scanning for the next start marker.
///
/// The parser is single-threaded. It may be moved between threads but concurrent use needs
/// external synchronization. Observers must be `Send` so a parser with subscribers stays `Send`
/// and can be handed to a reader running on another thread; share observer state through
/// `Arc<Mutex<_>>` or an `mpsc::Sender` rather than `Rc<RefCell<_>>`.
///
/// # Unbounded payloads
///
/// There is no timeout and no payload limit. A bounded message whose end marker never arrives
/// keeps the parser in [`Status::WaitData`] and the payload buffer keeps growing. Callers that
/// need bounded memory must watch [`pending_len`](Self::pending_len) and call
/// [`reset`](Self::reset), or use a reader that does so.
#[derive(Debug)]
pub struct Parser {
    markers: Markers,
    table: DescriptorTable,
    state: State,
    payload: BytesMut,
    observers: Observers,
}

impl Parser {
    /// Create a parser over a validated descriptor table.
    pub fn new(markers: Markers, table: DescriptorTable) -> Self {
        Self {
            markers,
            table,
            state: State::Idle,
            payload: BytesMut::with_capacity(INITIAL_PAYLOAD_CAPACITY),
            observers: Observers::default(),
        }
    }

    /// Subscribe an observer to completed and error events.
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: ParseObserver + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Subscribe a closure to completed messages.
    pub fn on_completed<F>(&mut self, f: F)
    where
        F: FnMut(&Message) + Send + 'static,
    {
        self.subscribe(CompletedFn(f));
    }

    /// Subscribe a closure to feed errors.
    pub fn on_error<F>(&mut self, f: F)
    where
        F: FnMut(&ParseError) + Send + 'static,
    {
        self.subscribe(ErrorFn(f));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Feed one byte.
    pub fn feed(&mut self, byte: u8) -> ParseResult {
        match self.advance(byte) {
            Some(event) => {
                self.observers.notify(&event);
                event.into()
            }
            None => ParseResult::Parsing,
        }
    }

    /// Feed a slice and collect the terminal events it produced, in order.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<ParseEvent> {
        bytes
            .iter()
            .filter_map(|&byte| self.feed(byte).into_event())
            .collect()
    }

    /// Abandon the message in progress and return to idle. Observers are not notified.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.payload.clear();
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Idle => Status::Idle,
            State::WaitId => Status::WaitId,
            State::WaitData { .. } => Status::WaitData,
            State::WaitCheckSum { .. } => Status::WaitCheckSum,
            State::WaitEoM { .. } => Status::WaitEoM,
        }
    }

    /// Descriptor selected for the message in progress.
    pub fn current_descriptor(&self) -> Option<&Descriptor> {
        match &self.state {
            State::Idle | State::WaitId => None,
            State::WaitData { descriptor, .. }
            | State::WaitCheckSum { descriptor, .. }
            | State::WaitEoM { descriptor } => Some(descriptor),
        }
    }

    /// Payload bytes accumulated for the message in progress.
    pub fn pending_len(&self) -> usize {
        match self.state {
            State::Idle | State::WaitId => 0,
            _ => self.payload.len(),
        }
    }

    pub fn markers(&self) -> Markers {
        self.markers
    }

    pub fn start_marker(&self) -> u8 {
        self.markers.start
    }

    pub fn end_marker(&self) -> u8 {
        self.markers.end
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    fn advance(&mut self, byte: u8) -> Option<ParseEvent> {
        // Terminal transitions leave the machine idle; non-terminal ones store the next state.
        let state = std::mem::replace(&mut self.state, State::Idle);

        match state {
            State::Idle => {
                if byte != self.markers.start {
                    return Some(self.fail(ParseErrorKind::Sync, byte));
                }
                self.payload.clear();
                self.state = State::WaitId;
                None
            }
            State::WaitId => {
                let Some(descriptor) = self.table.lookup(byte).copied() else {
                    return Some(self.fail(ParseErrorKind::MissingId, byte));
                };
                self.state = State::WaitData {
                    descriptor,
                    remaining: descriptor.framing().length().unwrap_or(0),
                    checksum: Checksum::new(),
                };
                None
            }
            State::WaitData {
                descriptor,
                mut remaining,
                mut checksum,
            } => {
                self.payload.put_u8(byte);
                if descriptor.checksum() {
                    checksum.update(byte);
                }

                let finished = match descriptor.framing() {
                    Framing::Sized(_) => {
                        let Some(left) = remaining.checked_sub(1) else {
                            return Some(self.fail(ParseErrorKind::Format, byte));
                        };
                        remaining = left;
                        remaining == 0
                    }
                    Framing::Bounded => byte == self.markers.end,
                };

                self.state = if !finished {
                    State::WaitData {
                        descriptor,
                        remaining,
                        checksum,
                    }
                } else if descriptor.checksum() {
                    State::WaitCheckSum {
                        descriptor,
                        checksum,
                    }
                } else {
                    State::WaitEoM { descriptor }
                };
                None
            }
            State::WaitCheckSum {
                descriptor,
                checksum,
            } => {
                if byte != checksum.value() {
                    return Some(self.fail(ParseErrorKind::Checksum, byte));
                }
                match descriptor.framing() {
                    // The checksum byte closes a sized message.
                    Framing::Sized(_) => Some(self.complete(descriptor)),
                    Framing::Bounded => {
                        self.state = State::WaitEoM { descriptor };
                        None
                    }
                }
            }
            State::WaitEoM { descriptor } => {
                if byte == self.markers.end {
                    Some(self.complete(descriptor))
                } else {
                    Some(self.fail(ParseErrorKind::MissingEom, byte))
                }
            }
        }
    }

    fn complete(&mut self, descriptor: Descriptor) -> ParseEvent {
        let payload = self.payload.split().freeze();
        trace!(id = descriptor.id(), len = payload.len(), "message completed");
        ParseEvent::Completed(Message {
            id: descriptor.id(),
            payload,
        })
    }

    fn fail(&mut self, kind: ParseErrorKind, byte: u8) -> ParseEvent {
        self.state = State::Idle;
        if kind == ParseErrorKind::Sync {
            trace!(byte, "discarding byte outside a message");
        } else {
            debug!(%kind, byte, "parse error, resynchronizing");
        }
        let observed = match kind {
            // Framing errors carry no value; the byte only matters to the log.
            ParseErrorKind::Sync | ParseErrorKind::MissingId => None,
            _ => Some(byte),
        };
        ParseEvent::Error(ParseError::new(kind, observed))
    }
}
