use bytes::{BufMut, BytesMut};

use crate::checksum::additive;
use crate::descriptor::{Descriptor, Framing};
use crate::error::EncodeError;
use crate::parser::Markers;

/// Encode one message in the wire form [`Parser`](crate::Parser) accepts.
///
/// Wire layout:
/// ```text
/// Sized, checksum:      SoM | id | data[N] | sum
/// Sized, no checksum:   SoM | id | data[N] | EoM
/// Bounded, checksum:    SoM | id | data | EoM | sum | EoM
/// Bounded, no checksum: SoM | id | data | EoM | EoM
/// ```
///
/// For bounded framing the first end marker terminates the data and becomes part of the parsed
/// payload; `sum` covers it.
pub fn encode_message(
    markers: Markers,
    descriptor: &Descriptor,
    data: &[u8],
    dst: &mut BytesMut,
) -> Result<(), EncodeError> {
    let id = descriptor.id();
    match descriptor.framing() {
        Framing::Sized(expected) => {
            if data.len() != expected {
                return Err(EncodeError::LengthMismatch {
                    id,
                    expected,
                    actual: data.len(),
                });
            }
            dst.reserve(data.len() + 3);
            dst.put_u8(markers.start);
            dst.put_u8(id);
            dst.put_slice(data);
            if descriptor.checksum() {
                dst.put_u8(additive(data));
            } else {
                dst.put_u8(markers.end);
            }
        }
        Framing::Bounded => {
            if let Some(offset) = data.iter().position(|&b| b == markers.end) {
                return Err(EncodeError::EmbeddedEndMarker { id, offset });
            }
            dst.reserve(data.len() + 5);
            dst.put_u8(markers.start);
            dst.put_u8(id);
            dst.put_slice(data);
            dst.put_u8(markers.end);
            if descriptor.checksum() {
                dst.put_u8(additive(data).wrapping_add(markers.end));
            }
            dst.put_u8(markers.end);
        }
    }
    Ok(())
}
