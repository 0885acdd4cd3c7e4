mod connect;
mod error;
mod index;

pub use connect::BlockConnect;
pub use error::IndexError;
pub use index::NevmIndex;
pub use nevm_bridge_wire::NevmBlock;
