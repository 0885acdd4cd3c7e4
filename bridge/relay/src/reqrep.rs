use std::sync::Arc;

use bytes::Bytes;
use nevm_bridge_indexer::NevmIndex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::{
    connect::decode_connect,
    outbound::reply_frames,
    proto::{self, Topic},
    RelayError, Result,
};

/// The request/reply relay: one reply socket multiplexing the three block
/// topics plus the `nevmcomms` control channel.
///
/// The socket discipline forbids pipelining, so a single worker serves all
/// topics in global FIFO order and the indexer is never called concurrently
/// from here.
pub struct ReqRepRelay<I: NevmIndex> {
    index: Arc<I>,
    node: Arc<I::Node>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    inited: bool,
}

impl<I: NevmIndex> ReqRepRelay<I> {
    /// Creates an uninitialised relay over the given indexer and EVM handle.
    pub fn new(index: Arc<I>, node: Arc<I::Node>) -> Self {
        Self { index, node, cancel: CancellationToken::new(), worker: None, inited: false }
    }

    /// True once `init` has succeeded and until `close` completes.
    pub fn is_initialised(&self) -> bool {
        self.inited
    }

    /// Binds the reply socket and spawns the worker.
    pub async fn init(&mut self, endpoint: &str) -> Result<()> {
        if self.inited {
            return Err(RelayError::AlreadyInitialised);
        }

        let mut socket = RepSocket::new();
        socket
            .bind(endpoint)
            .await
            .map_err(|source| RelayError::Bind { endpoint: endpoint.to_owned(), source })?;

        self.worker = Some(tokio::spawn(reply_worker(
            socket,
            self.index.clone(),
            self.node.clone(),
            self.cancel.clone(),
        )));
        self.inited = true;
        Ok(())
    }

    /// Cancels the worker and waits for it to release the socket.
    ///
    /// A no-op on an uninitialised relay; completes immediately when the
    /// worker already exited through the `nevmcomms` shutdown payload.
    pub async fn close(&mut self) {
        if !self.inited {
            return;
        }
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                log::error!("req/rep relay: worker task failed: {e}");
            }
        }
        // A fresh token so the relay can be initialised again.
        self.cancel = CancellationToken::new();
        self.inited = false;
    }
}

async fn reply_worker<I: NevmIndex>(
    mut socket: RepSocket,
    index: Arc<I>,
    node: Arc<I::Node>,
    cancel: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            recv = socket.recv() => match recv {
                Ok(msg) => msg,
                Err(e) => {
                    log::error!("reply worker: could not receive message: {e}");
                    continue;
                }
            },
        };

        let Some(topic_frame) = msg.get(0) else { continue };
        let Some(topic) = Topic::parse(topic_frame) else {
            // The host will time out and retry on a fresh request socket.
            log::warn!(
                "reply worker: ignoring unknown topic {:?}",
                String::from_utf8_lossy(topic_frame)
            );
            continue;
        };

        let reply = match topic {
            Topic::Comms => {
                if msg.get(1).is_some_and(|p| p.as_ref() == [proto::SHUTDOWN].as_slice()) {
                    log::info!("reply worker: shutdown requested by host");
                    return;
                }
                reply_frames(proto::COMMS, Bytes::from_static(proto::REPLY_ACK))
            }
            Topic::Connect => {
                if msg.len() != 2 {
                    log::error!("reply worker: invalid number of connect frames: {}", msg.len());
                    continue;
                }
                let Some(frame) = msg.get(1) else { continue };
                connect_reply(frame, index.as_ref(), &node).await
            }
            Topic::Disconnect => {
                if msg.len() != 2 {
                    log::error!("reply worker: invalid number of disconnect frames: {}", msg.len());
                    continue;
                }
                let Some(frame) = msg.get(1) else { continue };
                let payload: Bytes = match index.delete_block(frame, &node).await {
                    Ok(()) => Bytes::from_static(proto::REPLY_DISCONNECTED),
                    Err(e) => {
                        log::warn!("reply worker: indexer rejected rollback: {e}");
                        e.to_string().into()
                    }
                };
                reply_frames(proto::DISCONNECT, payload)
            }
            Topic::Block => {
                // Single attempt; an empty payload tells the host to retry later.
                match index.create_block(&node).await {
                    Some(block) => reply_frames(proto::BLOCK, alloy_rlp::encode(&block)),
                    None => reply_frames(proto::BLOCK, Bytes::new()),
                }
            }
        };

        if let Err(e) = socket.send(reply).await {
            log::error!("reply worker: could not send reply: {e}");
        }
    }
}

/// Runs the connect pipeline and always produces a reply: the reply socket
/// cannot skip a turn, so local rejections answer with the reason text.
async fn connect_reply<I: NevmIndex>(frame: &[u8], index: &I, node: &I::Node) -> ZmqMessage {
    let payload: Bytes = match decode_connect(frame) {
        Ok(connect) => match index.add_block(connect, node).await {
            Ok(()) => Bytes::from_static(proto::REPLY_CONNECTED),
            Err(e) => {
                log::warn!("reply worker: indexer rejected block: {e}");
                e.to_string().into()
            }
        },
        Err(e) => {
            log::error!("reply worker: rejected connect payload: {e}");
            e.to_string().into()
        }
    };
    reply_frames(proto::CONNECT, payload)
}
