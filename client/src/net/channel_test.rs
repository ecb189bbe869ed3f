use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;

use super::*;

const WAIT: Duration = Duration::from_secs(5);

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy { base_ms: 10, max_ms: 40 }
}

fn history(ids: &[&str]) -> String {
    let messages: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({"id": id, "userId": "u1", "userName": "Ahmed B.", "message": format!("msg {id}"), "timestamp": 1000}))
        .collect();
    serde_json::json!({"type": "history", "messages": messages}).to_string()
}

fn live(id: &str) -> String {
    serde_json::json!({"type": "message", "message": {"id": id, "userId": "u2", "userName": "Fatima Z.", "message": "live"}})
        .to_string()
}

async fn wait_for(handle: &ChannelHandle, predicate: impl FnMut(&ChannelSnapshot) -> bool) {
    let mut rx = handle.subscribe();
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("channel task gone");
}

#[test]
fn channel_config_uses_chat_url_and_policy() {
    let client = ClientConfig::default();
    let config = ChannelConfig::from_client(&client, Some("tok"));
    assert_eq!(config.url, "ws://localhost:4000/ws/chat?token=tok");
    assert_eq!(config.policy, client.reconnect);
}

#[test]
fn redacted_url_drops_token_query() {
    let client = ClientConfig::default();
    let config = ChannelConfig::from_client(&client, Some("secret-jwt"));
    assert_eq!(config.redacted_url(), "ws://localhost:4000/ws/chat");
    assert!(!config.redacted_url().contains("secret-jwt"));
    assert_eq!(redact_url("ws://localhost:4000/ws/chat"), "ws://localhost:4000/ws/chat");
}

#[tokio::test]
async fn history_live_message_dedupe_and_send() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        ws.send(Message::Text(history(&["a", "b"]).into())).await.expect("history");
        ws.send(Message::Text(live("c").into())).await.expect("live");
        ws.send(Message::Text(live("c").into())).await.expect("duplicate");
        ws.send(Message::Text("not json".into())).await.expect("garbage");
        let mut received = Vec::new();
        while received.len() < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    received.push(serde_json::from_str::<serde_json::Value>(text.as_str()).expect("json"));
                }
                Some(Ok(_)) => {}
                _ => break,
            }
        }
        received
    });

    let handle = spawn_channel(ChannelConfig { url: format!("ws://{addr}/chat"), policy: fast_policy() });
    wait_for(&handle, |s| s.messages.len() == 3).await;
    assert_eq!(handle.status(), ConnectionStatus::Connected);

    let ids: Vec<String> = handle.snapshot().messages.into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    handle.send("salam");
    handle.delete_message("a");
    wait_for(&handle, |s| s.messages.len() == 2).await;

    let received = timeout(WAIT, server).await.expect("server timed out").expect("server task");
    assert_eq!(received[0], serde_json::json!({"type": "message", "text": "salam"}));
    assert_eq!(received[1], serde_json::json!({"type": "delete", "messageId": "a"}));

    handle.shutdown().await;
}

#[tokio::test]
async fn reconnects_after_server_drop_and_resyncs_history() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept first");
        let mut ws = accept_async(tcp).await.expect("handshake first");
        ws.send(Message::Text(history(&["first"]).into())).await.expect("history first");
        drop(ws);

        let (tcp, _) = listener.accept().await.expect("accept second");
        let mut ws = accept_async(tcp).await.expect("handshake second");
        ws.send(Message::Text(history(&["second", "third"]).into())).await.expect("history second");
        // Hold the connection open until the client leaves.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut handle = spawn_channel(ChannelConfig { url: format!("ws://{addr}/chat"), policy: fast_policy() });
    wait_for(&handle, |s| s.status == ConnectionStatus::Connected && s.messages.len() == 2).await;
    assert_eq!(handle.snapshot().messages[0].id, "second");

    let mut saw_reconnect = false;
    while let Ok(Some(event)) = timeout(Duration::from_millis(200), handle.next_event()).await {
        if matches!(event, ChannelEvent::ReconnectIn(_)) {
            saw_reconnect = true;
        }
    }
    assert!(saw_reconnect);

    handle.shutdown().await;
}

#[tokio::test]
async fn server_error_frame_is_a_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        ws.send(Message::Text(r#"{"type":"error","message":"slow down"}"#.into())).await.expect("error");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut handle = spawn_channel(ChannelConfig { url: format!("ws://{addr}/chat"), policy: fast_policy() });
    let notice = timeout(WAIT, async {
        while let Some(event) = handle.next_event().await {
            if let ChannelEvent::Notice(text) = event {
                return Some(text);
            }
        }
        None
    })
    .await
    .expect("timed out");
    assert_eq!(notice.as_deref(), Some("slow down"));
    assert_eq!(handle.status(), ConnectionStatus::Connected);
    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_pending_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let slow = ReconnectPolicy { base_ms: 60_000, max_ms: 60_000 };
    let mut handle = spawn_channel(ChannelConfig { url: format!("ws://{addr}/chat"), policy: slow });

    let delay = timeout(WAIT, async {
        loop {
            match handle.next_event().await {
                Some(ChannelEvent::ReconnectIn(delay)) => break delay,
                Some(_) => {}
                None => panic!("task exited early"),
            }
        }
    })
    .await
    .expect("no reconnect scheduled");
    assert_eq!(delay, Duration::from_millis(60_000));
    assert_eq!(handle.status(), ConnectionStatus::Disconnected);

    let rx = handle.subscribe();
    timeout(Duration::from_secs(1), handle.shutdown()).await.expect("shutdown waited for the timer");
    assert_eq!(rx.borrow().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn send_while_disconnected_is_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let handle = spawn_channel(ChannelConfig {
        url: format!("ws://{addr}/chat"),
        policy: ReconnectPolicy { base_ms: 60_000, max_ms: 60_000 },
    });
    handle.send("lost");
    handle.delete_message("nothing");
    wait_for(&handle, |s| s.status == ConnectionStatus::Disconnected).await;
    assert!(handle.snapshot().messages.is_empty());
    handle.shutdown().await;
}
