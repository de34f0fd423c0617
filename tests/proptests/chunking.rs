//! Round-trip properties of record chunking and binary-text rendering.

use logrelay::logging::{split_payload, BitText, RECORD_PAYLOAD};
use proptest::prelude::*;

proptest! {
    /// Chunking loses no bytes and splits exactly at the payload boundary.
    #[test]
    fn prop_chunking_roundtrip(payload in proptest::collection::vec(1u8..=255, 0..3 * RECORD_PAYLOAD)) {
        let records = split_payload(&payload);

        let expected_count = payload.len().div_ceil(RECORD_PAYLOAD);
        prop_assert_eq!(records.len(), expected_count);

        for record in records.iter().take(records.len().saturating_sub(1)) {
            prop_assert_eq!(record.len(), RECORD_PAYLOAD);
        }

        let rejoined: Vec<u8> = records.iter().flat_map(|r| r.payload().to_vec()).collect();
        prop_assert_eq!(rejoined, payload);
    }

    /// Binary text is fixed-width and parses back to the source integer
    /// under a big-endian bit-string interpretation.
    #[test]
    fn prop_bit_text_roundtrip_u8(value: u8) {
        let text = value.bit_text();
        prop_assert_eq!(text.len(), 8);
        prop_assert_eq!(u8::from_str_radix(&text, 2).unwrap(), value);
    }

    #[test]
    fn prop_bit_text_roundtrip_u16(value: u16) {
        let text = value.bit_text();
        prop_assert_eq!(text.len(), 16);
        prop_assert_eq!(u16::from_str_radix(&text, 2).unwrap(), value);
    }

    #[test]
    fn prop_bit_text_roundtrip_u32(value: u32) {
        let text = value.bit_text();
        prop_assert_eq!(text.len(), 32);
        prop_assert_eq!(u32::from_str_radix(&text, 2).unwrap(), value);
    }

    #[test]
    fn prop_bit_text_roundtrip_u64(value: u64) {
        let text = value.bit_text();
        prop_assert_eq!(text.len(), 64);
        prop_assert_eq!(u64::from_str_radix(&text, 2).unwrap(), value);
    }
}
