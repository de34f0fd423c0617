// SPDX-License-Identifier: Apache-2.0 OR MIT
// Fixed-width log record, the unit of hand-off between producers and sinks

/// Total record slot size: 4 KiB of payload plus a NUL terminator.
pub const RECORD_SIZE: usize = 4097;

/// Usable payload bytes per record. Longer payloads are split into
/// successive records at this boundary.
pub const RECORD_PAYLOAD: usize = RECORD_SIZE - 1;

/// One fixed-capacity record. Carries no metadata beyond its bytes; ordering
/// is preserved by the queue it travels through.
#[derive(Clone)]
pub struct Record {
    bytes: Box<[u8; RECORD_SIZE]>,
}

impl Record {
    /// Build a record from a chunk of at most [`RECORD_PAYLOAD`] bytes.
    /// The tail of the slot is NUL-padded.
    pub fn from_chunk(chunk: &[u8]) -> Self {
        debug_assert!(chunk.len() <= RECORD_PAYLOAD);
        let mut bytes = Box::new([0u8; RECORD_SIZE]);
        let len = chunk.len().min(RECORD_PAYLOAD);
        bytes[..len].copy_from_slice(&chunk[..len]);
        Self { bytes }
    }

    /// Payload bytes up to the first NUL.
    pub fn payload(&self) -> &[u8] {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RECORD_PAYLOAD);
        &self.bytes[..end]
    }

    /// Payload interpreted as UTF-8 text; invalid sequences render empty.
    pub fn text(&self) -> &str {
        std::str::from_utf8(self.payload()).unwrap_or("")
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("len", &self.len())
            .field("text", &self.text())
            .finish()
    }
}

/// Split an arbitrary-length payload into records at [`RECORD_PAYLOAD`]
/// boundaries. An empty payload yields no records.
pub fn split_payload(payload: &[u8]) -> Vec<Record> {
    if payload.is_empty() {
        return Vec::new();
    }
    payload.chunks(RECORD_PAYLOAD).map(Record::from_chunk).collect()
}
