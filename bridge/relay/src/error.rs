use zeromq::ZmqError;

/// Error type for relay initialisation.
///
/// A failed init leaves the relay uninitialised; sockets built before the
/// failing step are dropped and nothing is spawned.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// `init` was called on an already-initialised relay.
    #[error("relay is already initialised")]
    AlreadyInitialised,

    /// The publisher or reply socket could not bind its endpoint.
    #[error("could not listen on {endpoint}")]
    Bind {
        endpoint: String,
        #[source]
        source: ZmqError,
    },

    /// A subscriber socket could not dial the inbound endpoint.
    #[error("could not dial {endpoint}")]
    Dial {
        endpoint: String,
        #[source]
        source: ZmqError,
    },

    /// A topic filter could not be installed.
    #[error("could not subscribe to topic {topic}")]
    Subscribe {
        topic: &'static str,
        #[source]
        source: ZmqError,
    },
}

pub type Result<T> = std::result::Result<T, RelayError>;
