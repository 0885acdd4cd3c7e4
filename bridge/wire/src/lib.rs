mod error;
mod payload;

pub use error::{Result, WireError};
pub use payload::ConnectPayload;

/// The EVM block type carried across the bridge: a consensus block whose
/// transactions are network-encoded envelopes.
pub type NevmBlock = alloy_consensus::Block<alloy_consensus::TxEnvelope>;
