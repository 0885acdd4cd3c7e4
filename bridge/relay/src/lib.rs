mod config;
mod connect;
mod error;
mod outbound;
pub mod proto;
mod pubsub;
mod reqrep;

pub use config::PubSubConfig;
pub use error::{RelayError, Result};
pub use pubsub::PubSubRelay;
pub use reqrep::ReqRepRelay;
