//! The host side of the bridge, in-process, for integration tests.

use std::{net::TcpListener, time::Duration};

use bytes::Bytes;
use tokio::time::timeout;
use zeromq::{PubSocket, ReqSocket, Socket, SocketRecv, SocketSend, SubSocket, ZmqMessage};

/// Delay for subscriptions to propagate before the first publish.
pub const SETTLE: Duration = Duration::from_millis(300);
/// Upper bound for any single wait in a test.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
/// Window after which an expected-absent reply is considered absent.
pub const NO_REPLY_WINDOW: Duration = Duration::from_millis(400);

/// Reserves a loopback TCP endpoint with an OS-assigned port.
///
/// The listener is dropped before returning; the port stays free long enough
/// for the socket under test to claim it.
pub fn free_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().expect("listener has a local addr").port();
    format!("tcp://127.0.0.1:{port}")
}

/// Host counterpart of the pub/sub relay: publishes events to the bridge's
/// subscribers and listens for every acknowledgement the bridge emits.
pub struct PubSubHost {
    events: PubSocket,
    replies: SubSocket,
}

impl PubSubHost {
    /// Binds the event publisher on the endpoint the bridge's subscribers
    /// will dial. Must run before the relay under test initialises.
    pub async fn bind(sub_endpoint: &str) -> Self {
        let mut events = PubSocket::new();
        events.bind(sub_endpoint).await.expect("bind host publisher");
        Self { events, replies: SubSocket::new() }
    }

    /// Dials the bridge's reply endpoint, subscribes to all topics and waits
    /// for the subscriptions (both directions) to propagate.
    pub async fn attach_replies(&mut self, pub_endpoint: &str) {
        self.replies.connect(pub_endpoint).await.expect("dial bridge publisher");
        self.replies.subscribe("").await.expect("subscribe to replies");
        tokio::time::sleep(SETTLE).await;
    }

    /// Publishes a two-frame `[topic, payload]` event.
    pub async fn send(&mut self, topic: &str, payload: impl Into<Bytes>) {
        let mut msg = ZmqMessage::from(topic.to_owned());
        msg.push_back(payload.into());
        self.events.send(msg).await.expect("publish event");
    }

    /// Publishes a bare one-frame event (the create-request shape).
    pub async fn send_topic_only(&mut self, topic: &str) {
        self.events.send(ZmqMessage::from(topic.to_owned())).await.expect("publish event");
    }

    /// Publishes a raw multi-frame message.
    pub async fn send_frames(&mut self, frames: Vec<Vec<u8>>) {
        let mut iter = frames.into_iter();
        let mut msg = ZmqMessage::from(iter.next().expect("at least one frame"));
        for frame in iter {
            msg.push_back(frame.into());
        }
        self.events.send(msg).await.expect("publish event");
    }

    /// Waits for the next `[topic, payload]` reply.
    pub async fn recv_reply(&mut self) -> (Vec<u8>, Vec<u8>) {
        let msg = timeout(REPLY_TIMEOUT, self.replies.recv())
            .await
            .expect("timed out waiting for reply")
            .expect("receive reply");
        split_reply(msg)
    }

    /// Asserts that no reply arrives within the no-reply window.
    pub async fn expect_no_reply(&mut self) {
        let result = timeout(NO_REPLY_WINDOW, self.replies.recv()).await;
        assert!(result.is_err(), "expected no reply, got {result:?}");
    }
}

/// Host counterpart of the req/rep relay.
pub struct ReqClient {
    socket: ReqSocket,
}

impl ReqClient {
    /// Dials the relay's reply endpoint.
    pub async fn connect(endpoint: &str) -> Self {
        let mut socket = ReqSocket::new();
        socket.connect(endpoint).await.expect("dial reply endpoint");
        Self { socket }
    }

    /// Sends `[topic, payload]` and waits for the reply.
    pub async fn request(&mut self, topic: &str, payload: impl Into<Bytes>) -> (Vec<u8>, Vec<u8>) {
        self.send(topic, payload).await;
        let msg = timeout(REPLY_TIMEOUT, self.socket.recv())
            .await
            .expect("timed out waiting for reply")
            .expect("receive reply");
        split_reply(msg)
    }

    /// Sends `[topic, payload]` without waiting for a reply (shutdown and
    /// deliberately abandoned requests).
    pub async fn send(&mut self, topic: &str, payload: impl Into<Bytes>) {
        let mut msg = ZmqMessage::from(topic.to_owned());
        msg.push_back(payload.into());
        self.socket.send(msg).await.expect("send request");
    }

    /// Asserts that no reply arrives within the no-reply window.
    pub async fn expect_no_reply(&mut self) {
        let result = timeout(NO_REPLY_WINDOW, self.socket.recv()).await;
        assert!(result.is_err(), "expected no reply, got {result:?}");
    }
}

fn split_reply(msg: ZmqMessage) -> (Vec<u8>, Vec<u8>) {
    let frames = msg.into_vec();
    assert_eq!(frames.len(), 2, "replies are two frames, got {}", frames.len());
    (frames[0].to_vec(), frames[1].to_vec())
}
