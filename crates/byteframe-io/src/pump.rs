use byteframe_parser::{ParseEvent, Parser};

/// Outcome of pushing a chunk of bytes through a parser.
#[derive(Debug)]
pub(crate) enum Pumped {
    /// Every byte was consumed without a terminal event.
    NeedMore,
    Event(ParseEvent),
    /// The message in progress exceeded `max`; the parser has been reset.
    Overflow { size: usize, max: usize },
}

/// Feed bytes until the first terminal event or limit breach.
///
/// Returns how many bytes of `src` were consumed.
pub(crate) fn pump(parser: &mut Parser, src: &[u8], max_payload: usize) -> (usize, Pumped) {
    for (index, &byte) in src.iter().enumerate() {
        if let Some(event) = parser.feed(byte).into_event() {
            return (index + 1, Pumped::Event(event));
        }

        let pending = parser.pending_len();
        if pending > max_payload {
            tracing::warn!(pending, max = max_payload, "payload limit exceeded, resetting parser");
            parser.reset();
            return (
                index + 1,
                Pumped::Overflow {
                    size: pending,
                    max: max_payload,
                },
            );
        }
    }
    (src.len(), Pumped::NeedMore)
}
