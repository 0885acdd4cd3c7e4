use alloy_primitives::{Bytes, B256};
use nevm_bridge_wire::NevmBlock;

/// A decoded, cross-checked connect event handed to [`NevmIndex::add_block`].
///
/// By the time this exists the bridge has verified that `block_hash` matches
/// the header hash and that the committed root matches the block's state root.
/// Parent-chaining to the current EVM head is the indexer's check.
///
/// [`NevmIndex::add_block`]: crate::NevmIndex::add_block
#[derive(Clone, Debug)]
pub struct BlockConnect {
    /// The decoded EVM block to apply.
    pub block: NevmBlock,
    /// Hash of `block`'s header.
    pub block_hash: B256,
    /// Identifier of the host block that embeds this EVM block.
    pub host_block_hash: Bytes,
    /// False while the host is replaying already-known blocks.
    pub wait_for_response: bool,
}
