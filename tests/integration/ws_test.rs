//! Real WebSocket round trips against a served endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use memberhub_core::{AppError, AppResult};
use memberhub_realtime::ws::{self, WsState};
use memberhub_realtime::{ChannelAuthenticator, ChannelIdentity};

use crate::helpers::{TestApp, reply_spec};

/// Fixed token table standing in for the portal's identity service.
struct TokenTable {
    tokens: HashMap<String, ChannelIdentity>,
}

#[async_trait]
impl ChannelAuthenticator for TokenTable {
    async fn authenticate(&self, token: &str) -> AppResult<ChannelIdentity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Unknown test token"))
    }
}

/// Serves the realtime router on an ephemeral port, returning `host:port`.
async fn serve(app: &TestApp, tokens: HashMap<String, ChannelIdentity>) -> String {
    let router = ws::router(WsState {
        engine: app.engine.clone(),
        authenticator: Arc::new(TokenTable { tokens }),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("127.0.0.1:{}", addr.port())
}

fn identity(user_id: Uuid, username: &str) -> ChannelIdentity {
    ChannelIdentity {
        user_id,
        username: username.to_string(),
    }
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reads frames until the next text frame, parsed as JSON.
async fn read_event(client: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed early")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("frames are JSON");
        }
    }
}

#[tokio::test]
async fn test_upgrade_without_a_known_token_is_rejected() {
    let app = TestApp::new();
    let addr = serve(&app, HashMap::new()).await;

    let err = connect_async(format!("ws://{addr}/ws?token=bogus"))
        .await
        .unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 401);
        }
        other => panic!("expected an HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_round_trip_over_a_live_socket() {
    let app = TestApp::new();
    let ana = app.seed_user("ana.torres").await;
    let kenji = app.seed_user("kenji").await;
    let tokens = HashMap::from([("ana-token".to_string(), identity(ana.id, "ana.torres"))]);
    let addr = serve(&app, tokens).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws?token=ana-token"))
        .await
        .unwrap();

    // An application ping proves the channel is registered and its loop
    // is live before anything is published at it.
    client
        .send(Message::text(r#"{"type":"ping","timestamp":7}"#))
        .await
        .unwrap();
    let pong = read_event(&mut client).await;
    assert_eq!(pong["event"], "pong");
    assert_eq!(pong["data"]["timestamp"], 7);

    // A notification lands on the socket with the fresh badge count.
    app.notifications
        .create_and_dispatch(reply_spec(ana.id, kenji.id))
        .await
        .unwrap();
    let pushed = read_event(&mut client).await;
    assert_eq!(pushed["event"], "notification:new");
    assert_eq!(pushed["data"]["unreadCount"], 1);

    // Subscribing to an own conversation is acknowledged.
    let conversation = app
        .conversations
        .find_or_create_direct(ana.id, kenji.id)
        .await
        .unwrap();
    client
        .send(Message::text(format!(
            r#"{{"type":"subscribe","room":"conversation:{}"}}"#,
            conversation.id
        )))
        .await
        .unwrap();
    let ack = read_event(&mut client).await;
    assert_eq!(ack["event"], "room:subscribed");

    // A message from the other member arrives, then the badge update.
    app.conversations
        .append_message(conversation.id, kenji.id, "lunch at noon?".to_string(), vec![])
        .await
        .unwrap();
    let message = read_event(&mut client).await;
    assert_eq!(message["event"], "conversation:message");
    assert_eq!(message["data"]["message"]["content"], "lunch at noon?");
    let badge = read_event(&mut client).await;
    assert_eq!(badge["event"], "conversation:unread");
    assert_eq!(badge["data"]["unreadCount"], 1);

    client.close(None).await.unwrap();
}

#[tokio::test]
async fn test_foreign_rooms_are_refused_over_the_wire() {
    let app = TestApp::new();
    let ana = app.seed_user("ana.torres").await;
    let kenji = app.seed_user("kenji").await;
    let chioma = app.seed_user("chioma").await;
    let private = app
        .conversations
        .find_or_create_direct(kenji.id, chioma.id)
        .await
        .unwrap();

    let tokens = HashMap::from([("ana-token".to_string(), identity(ana.id, "ana.torres"))]);
    let addr = serve(&app, tokens).await;
    let (mut client, _) = connect_async(format!("ws://{addr}/ws?token=ana-token"))
        .await
        .unwrap();

    // Not a participant of that conversation.
    client
        .send(Message::text(format!(
            r#"{{"type":"subscribe","room":"conversation:{}"}}"#,
            private.id
        )))
        .await
        .unwrap();
    let refusal = read_event(&mut client).await;
    assert_eq!(refusal["event"], "error");
    assert_eq!(refusal["data"]["code"], "forbidden");

    // Another member's private room is off limits too.
    client
        .send(Message::text(format!(
            r#"{{"type":"subscribe","room":"user:{}"}}"#,
            kenji.id
        )))
        .await
        .unwrap();
    let refusal = read_event(&mut client).await;
    assert_eq!(refusal["data"]["code"], "forbidden");

    client.close(None).await.unwrap();
}
