mod host;
mod mock_index;
mod sample;

pub use host::{free_endpoint, PubSubHost, ReqClient, NO_REPLY_WINDOW, REPLY_TIMEOUT, SETTLE};
pub use mock_index::MockIndex;
pub use sample::sample_block;
