//! Wire codec for keys
//!
//! The payload of every datagram is the key itself, one byte per character
//! (Latin-1), no framing or length prefix. This matches the existing
//! publishers and subscribers on the wire, so it is preserved byte for byte;
//! characters outside Latin-1 are sent as `?`, as the legacy encoder did.

/// Largest datagram the relay will receive
pub const MAX_DATAGRAM: usize = 5000;

/// Decode a received payload, one byte per character
pub fn decode_key(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a key for sending, one byte per character
pub fn encode_key(key: &str) -> Vec<u8> {
    key.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        assert_eq!(decode_key(b"ping"), "ping");
        assert_eq!(encode_key("ping"), b"ping");
    }

    #[test]
    fn high_latin1_bytes_decode_to_their_code_points() {
        // 0xE9 is 'é' in Latin-1.
        assert_eq!(decode_key(&[0x70, 0xE9]), "p\u{e9}");
        assert_eq!(encode_key("p\u{e9}"), vec![0x70, 0xE9]);
    }

    #[test]
    fn characters_outside_latin1_become_question_marks() {
        assert_eq!(encode_key("日本"), b"??");
    }

    #[test]
    fn empty_payload_decodes_to_empty_key() {
        assert_eq!(decode_key(&[]), "");
    }
}
