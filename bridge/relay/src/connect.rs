use alloy_primitives::B256;
use nevm_bridge_indexer::BlockConnect;
use nevm_bridge_wire::{ConnectPayload, WireError};

/// Local rejection of a connect payload, before the indexer is involved.
///
/// The display form doubles as the error reply on the req/rep relay.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConnectError {
    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("block hash mismatch: payload claims {claimed}, block hashes to {actual}")]
    HashMismatch { claimed: B256, actual: B256 },

    #[error("root mismatch: payload claims {claimed}, block state root is {actual}")]
    RootMismatch { claimed: B256, actual: B256 },
}

/// Decodes and cross-checks a connect payload frame.
///
/// The checks are the cheap local ones: wire framing, block RLP, and the two
/// digest comparisons the host commits in its coinbase. Semantic validation
/// (parent chaining, execution) stays with the indexer.
pub(crate) fn decode_connect(frame: &[u8]) -> Result<BlockConnect, ConnectError> {
    let payload = ConnectPayload::deserialize(frame)?;
    let block = payload.decode_block()?;

    let actual = block.header.hash_slow();
    if payload.evm_block_hash != actual {
        return Err(ConnectError::HashMismatch { claimed: payload.evm_block_hash, actual });
    }
    if payload.tx_root != block.header.state_root {
        return Err(ConnectError::RootMismatch {
            claimed: payload.tx_root,
            actual: block.header.state_root,
        });
    }

    Ok(BlockConnect {
        block_hash: actual,
        host_block_hash: payload.host_block_hash,
        wait_for_response: payload.wait_for_response,
        block,
    })
}
