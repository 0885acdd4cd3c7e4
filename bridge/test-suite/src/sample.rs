use alloy_consensus::{BlockBody, Header};
use alloy_primitives::B256;
use nevm_bridge_wire::NevmBlock;

/// Builds a deterministic empty EVM block with the given state root and number.
pub fn sample_block(state_root: B256, number: u64) -> NevmBlock {
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
