use std::time::Duration;

/// Configuration for the pub/sub relay.
#[derive(Clone, Debug)]
pub struct PubSubConfig {
    /// Endpoint the host publishes events on; the three topic subscribers dial it.
    pub sub_endpoint: String,
    /// Endpoint the relay binds and publishes acknowledgements on.
    pub pub_endpoint: String,
    /// Delay between `create_block` attempts while no candidate is ready.
    pub create_poll_interval: Duration,
    /// Bound of the outbound reply queue shared by the topic workers.
    pub outbound_queue_depth: usize,
}

impl PubSubConfig {
    /// Creates a configuration for the given endpoint pair.
    pub fn new(sub_endpoint: impl Into<String>, pub_endpoint: impl Into<String>) -> Self {
        Self {
            sub_endpoint: sub_endpoint.into(),
            pub_endpoint: pub_endpoint.into(),
            create_poll_interval: Duration::from_millis(50),
            outbound_queue_depth: 64,
        }
    }

    /// Sets the delay between unproductive `create_block` attempts.
    pub fn with_create_poll_interval(mut self, interval: Duration) -> Self {
        self.create_poll_interval = interval;
        self
    }

    /// Sets the bound of the outbound reply queue.
    pub fn with_outbound_queue_depth(mut self, depth: usize) -> Self {
        self.outbound_queue_depth = depth;
        self
    }
}
