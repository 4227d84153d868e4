//! SQL key codec.
//!
//! Produces the ordered key prefixes of table indexes so the catalog can
//! report index spans. Keys start with an optional tenant prefix followed by
//! the table and index IDs, each written with the order-preserving unsigned
//! varint encoding (small values fit in one byte, larger ones get a length
//! marker followed by big-endian bytes).

use crate::descriptor::{DescriptorId, IndexId, MAX_SYSTEM_CONFIG_DESC_ID};
use serde::{Deserialize, Serialize};

const INT_ZERO: u8 = 136;
const INT_SMALL: u64 = 109;
const INT_MAX: u8 = 253;
const TENANT_PREFIX: u8 = 0xfe;

/// Half-open key range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlCodec {
    /// `None` for the system tenant.
    tenant_id: Option<u64>,
}

impl SqlCodec {
    pub const fn system() -> Self {
        Self { tenant_id: None }
    }

    pub const fn tenant(id: u64) -> Self {
        Self { tenant_id: Some(id) }
    }

    pub fn for_system_tenant(&self) -> bool {
        self.tenant_id.is_none()
    }

    fn tenant_prefix(&self) -> Vec<u8> {
        match self.tenant_id {
            None => Vec::new(),
            Some(id) => {
                let mut key = vec![TENANT_PREFIX];
                encode_uvarint_ascending(&mut key, id);
                key
            }
        }
    }

    pub fn table_prefix(&self, table_id: DescriptorId) -> Vec<u8> {
        let mut key = self.tenant_prefix();
        encode_uvarint_ascending(&mut key, table_id as u64);
        key
    }

    pub fn index_prefix(&self, table_id: DescriptorId, index_id: IndexId) -> Vec<u8> {
        let mut key = self.table_prefix(table_id);
        encode_uvarint_ascending(&mut key, index_id as u64);
        key
    }

    pub fn index_span(&self, table_id: DescriptorId, index_id: IndexId) -> Span {
        let start = self.index_prefix(table_id, index_id);
        let end = prefix_end(&start);
        Span { start, end }
    }

    /// The span shared by every table with an ID up to
    /// [`MAX_SYSTEM_CONFIG_DESC_ID`].
    pub fn system_config_span(&self) -> Span {
        Span {
            start: self.table_prefix(0),
            end: self.table_prefix(MAX_SYSTEM_CONFIG_DESC_ID + 1),
        }
    }
}

/// Appends `v` so that byte-wise order of the encodings matches numeric order.
pub fn encode_uvarint_ascending(buf: &mut Vec<u8>, v: u64) {
    if v <= INT_SMALL {
        buf.push(INT_ZERO + v as u8);
        return;
    }
    let bytes = v.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let len = bytes.len() - skip;
    // Markers 246..=253 encode lengths 1..=8.
    buf.push(INT_MAX - (8 - len as u8));
    buf.extend_from_slice(&bytes[skip..]);
}

/// The first key that does not have `key` as a prefix.
pub fn prefix_end(key: &[u8]) -> Vec<u8> {
    let mut end = key.to_vec();
    while let Some(last) = end.last_mut() {
        if *last < 0xff {
            *last += 1;
            return end;
        }
        end.pop();
    }
    key.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uvarint_order() {
        let values = [0u64, 1, 109, 110, 255, 256, 65_535, 65_536, u32::MAX as u64, u64::MAX];
        let encoded: Vec<Vec<u8>> = values
            .iter()
            .map(|v| {
                let mut b = Vec::new();
                encode_uvarint_ascending(&mut b, *v);
                b
            })
            .collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
        }
        assert_eq!(encoded[0], vec![136]);
        assert_eq!(encoded[3], vec![246, 110]);
        assert_eq!(encoded[9][0], 253);
    }

    #[test]
    fn test_index_span() {
        let codec = SqlCodec::system();
        let span = codec.index_span(52, 1);
        assert_eq!(span.start, vec![136 + 52, 137]);
        assert_eq!(span.end, vec![136 + 52, 138]);

        let tenant = SqlCodec::tenant(10).index_span(52, 1);
        assert_eq!(tenant.start[0], TENANT_PREFIX);
        assert_ne!(tenant.start, span.start);
    }
}
