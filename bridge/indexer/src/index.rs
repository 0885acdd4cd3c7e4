use async_trait::async_trait;
use nevm_bridge_wire::NevmBlock;

use crate::{BlockConnect, IndexError};

/// The three operations the bridge drives on the embedded EVM.
///
/// `Node` is the opaque EVM handle; the bridge holds it and passes it back on
/// every call without ever looking inside. Implementations serialise their own
/// head mutations: the pub/sub relay may invoke these concurrently from
/// different topic workers.
#[async_trait]
pub trait NevmIndex: Send + Sync + 'static {
    /// The EVM node handle operations run against.
    type Node: Send + Sync + 'static;

    /// Applies a connect event to the EVM.
    ///
    /// May suspend for the duration of block execution. Re-delivery of an
    /// already-applied block must not corrupt state. On rejection the error's
    /// reason is relayed to the host.
    async fn add_block(&self, connect: BlockConnect, node: &Self::Node) -> Result<(), IndexError>;

    /// Rolls the EVM back over the identified host block.
    async fn delete_block(&self, host_block: &[u8], node: &Self::Node) -> Result<(), IndexError>;

    /// Assembles a candidate block for the host to embed, or `None` when one
    /// cannot be produced yet (empty mempool, state sync in progress).
    async fn create_block(&self, node: &Self::Node) -> Option<NevmBlock>;
}
