//! RREF packet codec
//!
//! Byte layouts shared with the simulator:
//!
//! ```text
//! request  (409 bytes): "RREF\0" | freq: i32 LE | index: i32 LE | name: [u8; 400] zero padded
//! response (variable) : "RREF" + 1 header byte | { index: i32 LE | value: f32 LE } * n
//! ```
//!
//! Only the 4-byte `RREF` prefix of a response is checked. Trailing bytes that
//! do not fill a whole 8-byte record are ignored.

use crate::types::{Result, RrefError, ValueUpdate};
use byteorder::{ByteOrder, LittleEndian};

/// Tag that opens every subscription request
pub const REQUEST_TAG: &[u8; 5] = b"RREF\0";

/// Prefix that identifies a response packet
pub const RESPONSE_TAG: &[u8; 4] = b"RREF";

/// Bytes before the first value record in a response
pub const RESPONSE_HEADER_LEN: usize = 5;

/// Size of one `(index, value)` record
pub const RECORD_LEN: usize = 8;

/// Width of the zero-padded name field in a request
pub const NAME_FIELD_LEN: usize = 400;

/// Total size of a subscription request
pub const REQUEST_LEN: usize = 5 + 4 + 4 + NAME_FIELD_LEN;

/// Build a subscription request for one dataref
///
/// A `frequency_hz` of 0 asks the simulator to stop sending the dataref.
/// Names longer than the 400-byte field are rejected.
pub fn encode_subscribe(name: &str, frequency_hz: i32, index: i32) -> Result<Vec<u8>> {
    let name_bytes = name.as_bytes();
    if name_bytes.len() > NAME_FIELD_LEN {
        return Err(RrefError::NameTooLong {
            name: name.to_string(),
            len: name_bytes.len(),
        });
    }

    let mut packet = vec![0u8; REQUEST_LEN];
    packet[..5].copy_from_slice(REQUEST_TAG);
    LittleEndian::write_i32(&mut packet[5..9], frequency_hz);
    LittleEndian::write_i32(&mut packet[9..13], index);
    packet[13..13 + name_bytes.len()].copy_from_slice(name_bytes);

    Ok(packet)
}

/// Build a request that cancels the subscription at `index`
pub fn encode_unsubscribe(name: &str, index: i32) -> Result<Vec<u8>> {
    encode_subscribe(name, 0, index)
}

/// Number of complete value records carried by a packet (0 if it is not RREF)
pub fn record_count(packet: &[u8]) -> usize {
    if packet.len() < RESPONSE_HEADER_LEN || !packet.starts_with(RESPONSE_TAG) {
        return 0;
    }
    (packet.len() - RESPONSE_HEADER_LEN) / RECORD_LEN
}

/// Decode the value records of a response packet
///
/// Returns an empty iterator for anything that is not an RREF response.
pub fn decode_updates(packet: &[u8]) -> UpdateIter<'_> {
    UpdateIter {
        packet,
        next: 0,
        count: record_count(packet),
    }
}

/// Lazy iterator over the records of one response packet, in packet order
#[derive(Debug, Clone)]
pub struct UpdateIter<'a> {
    packet: &'a [u8],
    next: usize,
    count: usize,
}

impl<'a> Iterator for UpdateIter<'a> {
    type Item = ValueUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }

        let offset = RESPONSE_HEADER_LEN + self.next * RECORD_LEN;
        let record = &self.packet[offset..offset + RECORD_LEN];
        self.next += 1;

        Some(ValueUpdate {
            index: LittleEndian::read_i32(&record[..4]),
            value: LittleEndian::read_f32(&record[4..]),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for UpdateIter<'_> {}
