use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use nevm_bridge_indexer::NevmIndex;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use zeromq::{PubSocket, Socket, SocketRecv, SubSocket, ZmqMessage};

use crate::{
    connect::decode_connect,
    outbound::{publish_loop, reply_frames},
    proto, PubSubConfig, RelayError, Result,
};

/// The publish/subscribe relay: three topic subscribers feeding the indexer,
/// one shared publisher carrying the acknowledgements back to the host.
///
/// Each topic gets its own subscriber socket so a slow `add_block` cannot
/// stall disconnect delivery. Within a topic, processing is serial and FIFO;
/// across topics there is no ordering.
pub struct PubSubRelay<I: NevmIndex> {
    index: Arc<I>,
    node: Arc<I::Node>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    inited: bool,
}

impl<I: NevmIndex> PubSubRelay<I> {
    /// Creates an uninitialised relay over the given indexer and EVM handle.
    pub fn new(index: Arc<I>, node: Arc<I::Node>) -> Self {
        Self {
            index,
            node,
            cancel: CancellationToken::new(),
            workers: Vec::new(),
            inited: false,
        }
    }

    /// True once `init` has succeeded and until `close` completes.
    pub fn is_initialised(&self) -> bool {
        self.inited
    }

    /// Binds the publisher, dials the topic subscribers, installs the filters
    /// and spawns the workers, in that order.
    ///
    /// A failure at any step drops whatever was built and leaves the relay
    /// uninitialised.
    pub async fn init(&mut self, config: PubSubConfig) -> Result<()> {
        if self.inited {
            return Err(RelayError::AlreadyInitialised);
        }

        let mut publisher = PubSocket::new();
        publisher.bind(&config.pub_endpoint).await.map_err(|source| RelayError::Bind {
            endpoint: config.pub_endpoint.clone(),
            source,
        })?;

        let mut connect_sub = SubSocket::new();
        let mut disconnect_sub = SubSocket::new();
        let mut create_sub = SubSocket::new();
        dial(&mut connect_sub, &config.sub_endpoint).await?;
        dial(&mut disconnect_sub, &config.sub_endpoint).await?;
        dial(&mut create_sub, &config.sub_endpoint).await?;
        filter(&mut connect_sub, proto::CONNECT).await?;
        filter(&mut disconnect_sub, proto::DISCONNECT).await?;
        filter(&mut create_sub, proto::BLOCK).await?;

        let (replies, outbound) = mpsc::channel(config.outbound_queue_depth);
        self.workers.push(tokio::spawn(publish_loop(publisher, outbound, self.cancel.clone())));
        self.workers.push(tokio::spawn(connect_worker(
            connect_sub,
            self.index.clone(),
            self.node.clone(),
            replies.clone(),
            self.cancel.clone(),
        )));
        self.workers.push(tokio::spawn(disconnect_worker(
            disconnect_sub,
            self.index.clone(),
            self.node.clone(),
            replies.clone(),
            self.cancel.clone(),
        )));
        self.workers.push(tokio::spawn(create_worker(
            create_sub,
            self.index.clone(),
            self.node.clone(),
            replies,
            config.create_poll_interval,
            self.cancel.clone(),
        )));

        self.inited = true;
        Ok(())
    }

    /// Cancels the workers and waits for them to release their sockets.
    ///
    /// A no-op on an uninitialised relay; safe to call twice.
    pub async fn close(&mut self) {
        if !self.inited {
            return;
        }
        self.cancel.cancel();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                log::error!("pub/sub relay: worker task failed: {e}");
            }
        }
        // A fresh token so the relay can be initialised again.
        self.cancel = CancellationToken::new();
        self.inited = false;
    }
}

async fn dial(sub: &mut SubSocket, endpoint: &str) -> Result<()> {
    sub.connect(endpoint)
        .await
        .map_err(|source| RelayError::Dial { endpoint: endpoint.to_owned(), source })
}

async fn filter(sub: &mut SubSocket, topic: &'static str) -> Result<()> {
    sub.subscribe(topic).await.map_err(|source| RelayError::Subscribe { topic, source })
}

/// Receives the next message, preferring cancellation over the socket.
///
/// Returns `None` when the relay is shutting down; transport errors are
/// logged and the receive retried.
async fn recv_or_cancel(
    sub: &mut SubSocket,
    cancel: &CancellationToken,
    who: &'static str,
) -> Option<ZmqMessage> {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            recv = sub.recv() => match recv {
                Ok(msg) => return Some(msg),
                Err(e) => log::error!("{who}: could not receive message: {e}"),
            },
        }
    }
}

async fn connect_worker<I: NevmIndex>(
    mut sub: SubSocket,
    index: Arc<I>,
    node: Arc<I::Node>,
    replies: mpsc::Sender<ZmqMessage>,
    cancel: CancellationToken,
) {
    while let Some(msg) = recv_or_cancel(&mut sub, &cancel, "connect worker").await {
        if msg.len() != 2 {
            log::error!("connect worker: invalid number of message frames: {}", msg.len());
            continue;
        }
        let Some(frame) = msg.get(1) else { continue };

        // Locally rejected payloads get no reply; the host re-sends on the
        // next sync round.
        let connect = match decode_connect(frame) {
            Ok(connect) => connect,
            Err(e) => {
                log::error!("connect worker: rejected payload: {e}");
                continue;
            }
        };

        let block_hash = connect.block_hash;
        let payload: Bytes = match index.add_block(connect, &node).await {
            Ok(()) => {
                log::debug!("connect worker: applied block {block_hash}");
                Bytes::from_static(proto::REPLY_CONNECTED)
            }
            Err(e) => {
                log::warn!("connect worker: indexer rejected block {block_hash}: {e}");
                e.to_string().into()
            }
        };
        if replies.send(reply_frames(proto::CONNECT, payload)).await.is_err() {
            return;
        }
    }
}

async fn disconnect_worker<I: NevmIndex>(
    mut sub: SubSocket,
    index: Arc<I>,
    node: Arc<I::Node>,
    replies: mpsc::Sender<ZmqMessage>,
    cancel: CancellationToken,
) {
    while let Some(msg) = recv_or_cancel(&mut sub, &cancel, "disconnect worker").await {
        if msg.len() != 2 {
            log::error!("disconnect worker: invalid number of message frames: {}", msg.len());
            continue;
        }
        let Some(frame) = msg.get(1) else { continue };

        let payload: Bytes = match index.delete_block(frame, &node).await {
            Ok(()) => {
                log::debug!(
                    "disconnect worker: rolled back host block {}",
                    alloy_primitives::hex::encode(frame)
                );
                Bytes::from_static(proto::REPLY_DISCONNECTED)
            }
            Err(e) => {
                log::warn!("disconnect worker: indexer rejected rollback: {e}");
                e.to_string().into()
            }
        };
        if replies.send(reply_frames(proto::DISCONNECT, payload)).await.is_err() {
            return;
        }
    }
}

async fn create_worker<I: NevmIndex>(
    mut sub: SubSocket,
    index: Arc<I>,
    node: Arc<I::Node>,
    replies: mpsc::Sender<ZmqMessage>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    while let Some(msg) = recv_or_cancel(&mut sub, &cancel, "create worker").await {
        // A creation request is the topic frame alone.
        if msg.len() != 1 {
            log::error!("create worker: invalid number of message frames: {}", msg.len());
            continue;
        }

        // The host treats block production as synchronous: keep asking the
        // indexer until a candidate exists, yielding between attempts.
        let block = loop {
            if let Some(block) = index.create_block(&node).await {
                break block;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(poll_interval) => {}
            }
        };

        log::info!("create worker: assembled candidate block {}", block.header.hash_slow());
        let rlp = alloy_rlp::encode(&block);
        if replies.send(reply_frames(proto::BLOCK, rlp)).await.is_err() {
            return;
        }
    }
}
