//! The topic alphabet and reply literals shared with the host.

/// Topic for host chain extensions the EVM must ingest.
pub const CONNECT: &str = "nevmconnect";
/// Topic for host reorganisations the EVM must roll back.
pub const DISCONNECT: &str = "nevmdisconnect";
/// Topic for candidate block production.
pub const BLOCK: &str = "nevmblock";
/// Control topic of the req/rep relay.
pub const COMMS: &str = "nevmcomms";

/// Acknowledgement payload for a successfully applied block.
pub const REPLY_CONNECTED: &[u8] = b"connected";
/// Acknowledgement payload for a successful rollback.
pub const REPLY_DISCONNECTED: &[u8] = b"disconnected";
/// Acknowledgement payload for control messages.
pub const REPLY_ACK: &[u8] = b"ack";

/// Control payload that terminates the req/rep worker.
pub const SHUTDOWN: u8 = 0x00;

/// A recognised topic tag (frame 0 of every message).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Topic {
    Connect,
    Disconnect,
    Block,
    Comms,
}

impl Topic {
    /// Maps a raw topic frame to a known topic.
    pub(crate) fn parse(frame: &[u8]) -> Option<Self> {
        if frame == CONNECT.as_bytes() {
            Some(Self::Connect)
        } else if frame == DISCONNECT.as_bytes() {
            Some(Self::Disconnect)
        } else if frame == BLOCK.as_bytes() {
            Some(Self::Block)
        } else if frame == COMMS.as_bytes() {
            Some(Self::Comms)
        } else {
            None
        }
    }
}
