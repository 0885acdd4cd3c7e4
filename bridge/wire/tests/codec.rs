use alloy_consensus::{BlockBody, Header};
use alloy_primitives::{Bytes, B256};
use nevm_bridge_wire::{ConnectPayload, NevmBlock, WireError};

fn block_with_root(state_root: B256, number: u64) -> NevmBlock {
    let header = Header {
        number,
        state_root,
        gas_limit: 30_000_000,
        timestamp: 1_700_000_000 + number,
        ..Default::default()
    };
    NevmBlock {
        header,
        body: BlockBody { transactions: Vec::new(), ommers: Vec::new(), withdrawals: None },
    }
}

/// Hand-assembles payload bytes so framing errors can be injected.
fn manual_payload(block_data_prefix: &[u8], block_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(block_data_prefix);
    out.extend_from_slice(block_data);
    out.extend_from_slice(&[0xAA; 32]);
    out.extend_from_slice(&[0xBB; 32]);
    out.push(0); // empty host block hash
    out.push(1); // wait_for_response
    out
}

#[test]
fn round_trip_preserves_every_field() {
    let block = block_with_root(B256::repeat_byte(0xBB), 7);
    let payload = ConnectPayload::from_block(&block, b"sys-1".to_vec(), true);

    let decoded = ConnectPayload::deserialize(&payload.serialize()).expect("valid payload");
    assert_eq!(decoded, payload);
    assert_eq!(decoded.host_block_hash.as_ref(), b"sys-1");
    assert!(decoded.wait_for_response);
    assert_eq!(decoded.decode_block().expect("valid block"), block);
}

#[test]
fn cross_check_fields_match_the_block() {
    let block = block_with_root(B256::repeat_byte(0xBB), 1);
    let payload = ConnectPayload::from_block(&block, b"sys-1".to_vec(), true);

    let decoded = ConnectPayload::deserialize(&payload.serialize()).expect("valid payload");
    let inner = decoded.decode_block().expect("valid block");
    assert_eq!(decoded.evm_block_hash, inner.header.hash_slow());
    assert_eq!(decoded.tx_root, inner.header.state_root);
}

#[test]
fn wait_flag_false_round_trips() {
    let block = block_with_root(B256::repeat_byte(0x11), 3);
    let payload = ConnectPayload::from_block(&block, b"sys-3".to_vec(), false);

    let decoded = ConnectPayload::deserialize(&payload.serialize()).expect("valid payload");
    assert!(!decoded.wait_for_response);
}

#[test]
fn long_fields_use_the_wide_prefix() {
    let block = block_with_root(B256::ZERO, 2);
    // 300 bytes forces the 0xfd two-byte length prefix.
    let payload = ConnectPayload::from_block(&block, vec![0x5A; 300], true);

    let decoded = ConnectPayload::deserialize(&payload.serialize()).expect("valid payload");
    assert_eq!(decoded.host_block_hash.len(), 300);
}

#[test]
fn truncation_is_rejected_at_every_cut() {
    let block = block_with_root(B256::repeat_byte(0x22), 4);
    let bytes = ConnectPayload::from_block(&block, b"sys-4".to_vec(), true).serialize();

    for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        let err = ConnectPayload::deserialize(&bytes[..cut]).expect_err("truncated input");
        assert!(matches!(err, WireError::Truncated { .. }), "cut at {cut}: got {err}");
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let block = block_with_root(B256::repeat_byte(0x33), 5);
    let mut bytes = ConnectPayload::from_block(&block, b"sys-5".to_vec(), true).serialize();
    bytes.push(0x00);

    let err = ConnectPayload::deserialize(&bytes).expect_err("trailing input");
    assert!(matches!(err, WireError::TrailingBytes { extra: 1 }), "got {err}");
}

#[test]
fn non_canonical_length_prefix_is_rejected() {
    // Length 5 must be a direct byte, not an 0xfd-prefixed u16.
    let bytes = manual_payload(&[0xfd, 0x05, 0x00], &[0u8; 5]);

    let err = ConnectPayload::deserialize(&bytes).expect_err("non-canonical prefix");
    assert!(matches!(err, WireError::NonCanonicalLength { offset: 0 }), "got {err}");
}

#[test]
fn oversized_field_is_rejected_before_reading_it() {
    // Claims a 16 MiB block-data field; no data follows.
    let len: u32 = 16 * 1024 * 1024;
    let mut bytes = vec![0xfe];
    bytes.extend_from_slice(&len.to_le_bytes());

    let err = ConnectPayload::deserialize(&bytes).expect_err("oversized field");
    assert!(matches!(err, WireError::FieldTooLarge { .. }), "got {err}");
}

#[test]
fn undecodable_block_rlp_is_rejected() {
    let bytes = manual_payload(&[4], &[0xde, 0xad, 0xbe, 0xef]);

    let payload = ConnectPayload::deserialize(&bytes).expect("framing is valid");
    let err = payload.decode_block().expect_err("garbage RLP");
    assert!(matches!(err, WireError::Rlp(_)), "got {err}");
}

#[test]
fn trailing_bytes_after_block_rlp_are_rejected() {
    let block = block_with_root(B256::repeat_byte(0x44), 6);
    let mut data = alloy_rlp::encode(&block);
    data.push(0x00);

    let payload = ConnectPayload {
        evm_block_data: Bytes::from(data),
        evm_block_hash: block.header.hash_slow(),
        tx_root: block.header.state_root,
        host_block_hash: Bytes::new(),
        wait_for_response: true,
    };
    let err = payload.decode_block().expect_err("trailing RLP");
    assert!(matches!(err, WireError::TrailingRlp { extra: 1 }), "got {err}");
}
