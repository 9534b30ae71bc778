use bitcoin::opcodes::all::{OP_PUSHDATA1, OP_RETURN};

/// Extracts an `OP_RETURN` payload from a locking script, per the literal
/// byte-offset rule in `SPEC_FULL.md` §4.1: total script length in `[2, 83]`,
/// first byte is `OP_RETURN`; if the second byte is `OP_PUSHDATA1` the
/// payload starts at byte 3, otherwise at byte 2.
///
/// Unlike `crates/l1tx/src/utils.rs`'s `next_op`/`next_bytes` (which walk a
/// `bitcoin::script::Instructions` iterator to parse a structured tag), this
/// operates on the raw bytes directly — the contract here is a fixed byte
/// layout, not an instruction grammar.
pub fn extract_op_return_payload(script_bytes: &[u8]) -> Option<&[u8]> {
    if script_bytes.len() < 2 || script_bytes.len() > 83 {
        return None;
    }
    if script_bytes[0] != OP_RETURN.to_u8() {
        return None;
    }

    let start = if script_bytes[1] == OP_PUSHDATA1.to_u8() {
        3
    } else {
        2
    };

    match script_bytes.get(start..) {
        Some(payload) if !payload.is_empty() => Some(payload),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_script_shorter_than_two_bytes() {
        assert!(extract_op_return_payload(&[OP_RETURN.to_u8()]).is_none());
    }

    #[test]
    fn rejects_script_longer_than_83_bytes() {
        let mut script = vec![OP_RETURN.to_u8(), 0x01];
        script.extend(vec![0u8; 83]);
        assert!(extract_op_return_payload(&script).is_none());
    }

    #[test]
    fn rejects_non_op_return_first_byte() {
        assert!(extract_op_return_payload(&[0x51, 0x02, 0xaa, 0xbb]).is_none());
    }

    #[test]
    fn decodes_from_byte_two_without_pushdata1() {
        let script = [OP_RETURN.to_u8(), 0x02, 0xaa, 0xbb];
        assert_eq!(extract_op_return_payload(&script), Some(&[0xaa, 0xbb][..]));
    }

    #[test]
    fn decodes_from_byte_three_with_pushdata1() {
        let script = [OP_RETURN.to_u8(), OP_PUSHDATA1.to_u8(), 0x02, 0xaa, 0xbb];
        assert_eq!(extract_op_return_payload(&script), Some(&[0xaa, 0xbb][..]));
    }

    #[test]
    fn rejects_op_return_plus_push_zero() {
        // length-2 script: OP_RETURN followed by a single push-length byte of
        // zero. The sliced payload is empty, which is not a payload.
        let script = [OP_RETURN.to_u8(), 0x00];
        assert!(extract_op_return_payload(&script).is_none());
    }
}
