use std::{sync::Arc, time::Duration};

use alloy_primitives::B256;
use nevm_bridge_relay::{proto, ReqRepRelay};
use nevm_bridge_test_suite::{free_endpoint, sample_block, MockIndex, ReqClient};
use nevm_bridge_wire::ConnectPayload;
use tokio::time::timeout;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

async fn setup() -> (ReqClient, ReqRepRelay<MockIndex>, Arc<MockIndex>, String) {
    let endpoint = free_endpoint();
    let index = Arc::new(MockIndex::new());
    let mut relay = ReqRepRelay::new(index.clone(), Arc::new(()));
    relay.init(&endpoint).await.expect("relay init");
    let client = ReqClient::connect(&endpoint).await;
    (client, relay, index, endpoint)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_comms_acknowledges_non_shutdown_payloads() {
    let (mut client, mut relay, _index, _) = setup().await;

    let (topic, reply) = client.request(proto::COMMS, b"ping".to_vec()).await;
    assert_eq!(topic, proto::COMMS.as_bytes());
    assert_eq!(reply, proto::REPLY_ACK);

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_applies_block_and_relays_rejections() {
    let (mut client, mut relay, index, _) = setup().await;

    let block = sample_block(B256::repeat_byte(0xBB), 1);
    let payload = ConnectPayload::from_block(&block, b"sys-1".to_vec(), true);

    let (topic, reply) = client.request(proto::CONNECT, payload.serialize()).await;
    assert_eq!(topic, proto::CONNECT.as_bytes());
    assert_eq!(reply, proto::REPLY_CONNECTED);
    assert_eq!(index.added().len(), 1);

    index.reject_next_add("stale parent");
    let (_, reply) = client.request(proto::CONNECT, payload.serialize()).await;
    assert_eq!(reply, b"stale parent");

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_codec_failure_is_answered_with_a_reason() {
    let (mut client, mut relay, index, _) = setup().await;

    let (topic, reply) = client.request(proto::CONNECT, b"garbage".to_vec()).await;
    assert_eq!(topic, proto::CONNECT.as_bytes());
    assert!(!reply.is_empty(), "codec failures must carry a reason");
    assert_ne!(reply, proto::REPLY_CONNECTED);
    assert!(index.added().is_empty(), "undecodable payload must not reach the indexer");

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_cross_check_failure_is_answered_with_a_reason() {
    let (mut client, mut relay, index, _) = setup().await;

    let block = sample_block(B256::repeat_byte(0xBB), 2);
    let mut payload = ConnectPayload::from_block(&block, b"sys-2".to_vec(), true);
    payload.evm_block_hash = B256::repeat_byte(0xFF);

    let (_, reply) = client.request(proto::CONNECT, payload.serialize()).await;
    assert!(!reply.is_empty());
    assert_ne!(reply, proto::REPLY_CONNECTED);
    assert!(index.added().is_empty());

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_round_trip() {
    let (mut client, mut relay, index, _) = setup().await;

    let (topic, reply) = client.request(proto::DISCONNECT, b"sys-6".to_vec()).await;
    assert_eq!(topic, proto::DISCONNECT.as_bytes());
    assert_eq!(reply, proto::REPLY_DISCONNECTED);

    index.reject_next_delete("unknown block");
    let (_, reply) = client.request(proto::DISCONNECT, b"sys-7".to_vec()).await;
    assert_eq!(reply, b"unknown block");
    assert_eq!(index.deleted(), vec![b"sys-6".to_vec(), b"sys-7".to_vec()]);

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_block_not_ready_replies_with_empty_payload() {
    let (mut client, mut relay, index, _) = setup().await;

    let (topic, reply) = client.request(proto::BLOCK, Vec::new()).await;
    assert_eq!(topic, proto::BLOCK.as_bytes());
    assert!(reply.is_empty(), "not-ready must be the empty payload");
    assert_eq!(index.create_calls(), 1, "a single attempt, no polling");

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_block_ready_replies_with_rlp() {
    let (mut client, mut relay, index, _) = setup().await;

    let candidate = sample_block(B256::repeat_byte(0xCC), 9);
    index.push_create(Some(candidate.clone()));

    let (topic, reply) = client.request(proto::BLOCK, Vec::new()).await;
    assert_eq!(topic, proto::BLOCK.as_bytes());
    assert_eq!(reply, alloy_rlp::encode(&candidate));

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_payload_quiesces_the_worker() {
    let (mut client, mut relay, index, _) = setup().await;

    client.send(proto::COMMS, vec![proto::SHUTDOWN]).await;

    // The shutdown request itself is never answered.
    client.expect_no_reply().await;

    // The worker has already exited; close must not block on it.
    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close after shutdown");
    assert!(index.added().is_empty());
    assert!(index.deleted().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_topic_is_ignored_and_worker_survives() {
    let (mut abandoned, mut relay, _index, endpoint) = setup().await;

    // This request is never answered; the host-side socket is abandoned.
    abandoned.send("nevmfrobnicate", b"x".to_vec()).await;
    abandoned.expect_no_reply().await;

    // A fresh request socket still gets served.
    let mut client = ReqClient::connect(&endpoint).await;
    let (_, reply) = client.request(proto::COMMS, b"ping".to_vec()).await;
    assert_eq!(reply, proto::REPLY_ACK);

    timeout(CLOSE_TIMEOUT, relay.close()).await.expect("close in bounded time");
}
