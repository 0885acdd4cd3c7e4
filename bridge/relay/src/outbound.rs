use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zeromq::{PubSocket, SocketSend, ZmqMessage};

/// Builds a two-frame reply: topic echoed in frame 0, payload in frame 1.
pub(crate) fn reply_frames(topic: &'static str, payload: impl Into<Bytes>) -> ZmqMessage {
    let mut msg = ZmqMessage::from(Bytes::from_static(topic.as_bytes()));
    msg.push_back(payload.into());
    msg
}

/// Drains the reply channel into the shared publisher socket.
///
/// The publisher has a single writer: topic workers enqueue replies here and
/// the channel bound is the backpressure point. Send failures are logged and
/// the pump keeps draining.
pub(crate) async fn publish_loop(
    mut publisher: PubSocket,
    mut replies: mpsc::Receiver<ZmqMessage>,
    cancel: CancellationToken,
) {
    loop {
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => return,
            },
        };
        if let Err(e) = publisher.send(reply).await {
            log::error!("publish loop: could not send reply: {e}");
        }
    }
}
