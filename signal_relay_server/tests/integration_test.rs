//! End-to-end tests against a real server on an ephemeral port

use futures::{SinkExt, StreamExt};
use serde_json::json;
use signal_relay_protocol::{Identity, ServerEvent, SignalMessage};
use signal_relay_server::{ServerConfig, ServerHandle, start};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

fn id(s: &str) -> Identity {
    Identity::new(s).unwrap()
}

async fn start_server() -> ServerHandle {
    let config = ServerConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        static_dir: None,
        ..Default::default()
    };
    start(config).await.expect("server should start")
}

async fn wait_for_connections(handle: &ServerHandle, count: usize) {
    tokio::time::timeout(TIMEOUT, async {
        while handle.registry().connection_count() != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {count} connections, have {}",
            handle.registry().connection_count()
        )
    });
}

async fn connect(handle: &ServerHandle, caller_id: &str) -> Client {
    let expected = handle.registry().connection_count() + 1;
    let url = format!("ws://{}/ws?callerId={caller_id}", handle.local_addr());
    let (ws, _) = connect_async(url).await.expect("handshake should succeed");
    wait_for_connections(handle, expected).await;
    ws
}

async fn send(ws: &mut Client, message: SignalMessage) {
    ws.send(Message::text(message.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> ServerEvent {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().parse().unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn assert_silent(ws: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

#[tokio::test]
async fn refuses_handshake_without_caller_id() {
    let handle = start_server().await;

    for url in [
        format!("ws://{}/ws", handle.local_addr()),
        format!("ws://{}/ws?callerId=", handle.local_addr()),
        format!("ws://{}/ws?callerId=&callerId=x", handle.local_addr()),
    ] {
        match connect_async(url).await {
            Err(WsError::Http(response)) => assert_eq!(response.status(), 401),
            Err(err) => panic!("expected 401, got {err}"),
            Ok(_) => panic!("expected 401, handshake succeeded"),
        }
    }

    assert_eq!(handle.registry().connection_count(), 0);
    assert_eq!(handle.registry().identity_count(), 0);
}

#[tokio::test]
async fn relays_a_full_call_setup() {
    let handle = start_server().await;
    let mut alice = connect(&handle, "alice").await;
    let mut bob = connect(&handle, "bob").await;
    let mut carol = connect(&handle, "carol").await;

    send(
        &mut alice,
        SignalMessage::CallOffer {
            callee: id("bob"),
            sdp_offer: json!({"type": "offer", "sdp": "v=0"}),
        },
    )
    .await;
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::NewCall {
            caller_id: id("alice"),
            sdp_offer: json!({"type": "offer", "sdp": "v=0"}),
        }
    );

    send(
        &mut bob,
        SignalMessage::CallAnswer {
            caller: id("alice"),
            sdp_answer: json!("answer-sdp"),
        },
    )
    .await;
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::CallAnswered {
            callee: id("bob"),
            sdp_answer: json!("answer-sdp"),
        }
    );

    send(
        &mut alice,
        SignalMessage::IceCandidate {
            callee: id("bob"),
            ice_candidate: json!({"candidate": "candidate:0 1 UDP 2122252543 192.0.2.1 54400 typ host"}),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut bob).await,
        ServerEvent::IceCandidate { sender, .. } if sender == id("alice")
    ));

    assert_silent(&mut carol).await;
    handle.shutdown().await;
}

#[tokio::test]
async fn rejection_reason_defaults_when_absent() {
    let handle = start_server().await;
    let mut alice = connect(&handle, "A").await;
    let mut bob = connect(&handle, "B").await;

    send(&mut bob, SignalMessage::CallRejection { caller: id("A"), reason: None }).await;
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::CallRejected {
            callee: id("B"),
            reason: "Call rejected by the callee.".into(),
        }
    );

    send(
        &mut bob,
        SignalMessage::CallRejection {
            caller: id("A"),
            reason: Some("busy now".into()),
        },
    )
    .await;
    assert_eq!(
        recv(&mut alice).await,
        ServerEvent::CallRejected {
            callee: id("B"),
            reason: "busy now".into(),
        }
    );
}

#[tokio::test]
async fn invalid_messages_are_dropped_without_reply() {
    let handle = start_server().await;
    let mut alice = connect(&handle, "alice").await;
    let mut bob = connect(&handle, "bob").await;

    alice
        .send(Message::text(r#"{"event":"makeCall","data":{"calleeId":"bob"}}"#))
        .await
        .unwrap();
    alice.send(Message::text("not json")).await.unwrap();

    assert_silent(&mut bob).await;
    assert_silent(&mut alice).await;

    // The connection is still usable afterwards.
    send(&mut alice, SignalMessage::MissedCallNotice { callee: id("bob") }).await;
    assert!(matches!(recv(&mut bob).await, ServerEvent::MissedCall { .. }));
}

#[tokio::test]
async fn fans_out_to_every_connection_of_an_identity() {
    let handle = start_server().await;
    let mut caller = connect(&handle, "A").await;
    let mut phone = connect(&handle, "X").await;
    let mut laptop = connect(&handle, "X").await;

    send(&mut caller, SignalMessage::BusyNotice { caller: id("X") }).await;
    assert!(matches!(recv(&mut phone).await, ServerEvent::UserBusy { .. }));
    assert!(matches!(recv(&mut laptop).await, ServerEvent::UserBusy { .. }));

    phone.close(None).await.unwrap();
    wait_for_connections(&handle, 2).await;

    send(&mut caller, SignalMessage::BusyNotice { caller: id("X") }).await;
    assert_eq!(
        recv(&mut laptop).await,
        ServerEvent::UserBusy {
            callee: id("A"),
            message: "The callee is currently busy.".into(),
        }
    );
}

#[tokio::test]
async fn preserves_order_per_sender() {
    let handle = start_server().await;
    let mut a = connect(&handle, "A").await;
    let mut c = connect(&handle, "C").await;
    let mut b = connect(&handle, "B").await;

    for n in 0..20 {
        send(
            &mut a,
            SignalMessage::IceCandidate {
                callee: id("B"),
                ice_candidate: json!(n),
            },
        )
        .await;
        send(
            &mut c,
            SignalMessage::IceCandidate {
                callee: id("B"),
                ice_candidate: json!(n),
            },
        )
        .await;
    }

    let mut from_a = Vec::new();
    let mut from_c = Vec::new();
    for _ in 0..40 {
        match recv(&mut b).await {
            ServerEvent::IceCandidate {
                sender,
                ice_candidate,
            } if sender == id("A") => from_a.push(ice_candidate),
            ServerEvent::IceCandidate { ice_candidate, .. } => from_c.push(ice_candidate),
            other => panic!("unexpected event {other:?}"),
        }
    }

    let expected: Vec<_> = (0..20).map(|n| json!(n)).collect();
    assert_eq!(from_a, expected);
    assert_eq!(from_c, expected);
}

#[tokio::test]
async fn disconnect_releases_binding() {
    let handle = start_server().await;
    let mut ws = connect(&handle, "alice").await;
    assert_eq!(handle.registry().identity_count(), 1);

    ws.close(None).await.unwrap();
    wait_for_connections(&handle, 0).await;
    assert_eq!(handle.registry().identity_count(), 0);
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let handle = start_server().await;
    let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("OK"), "{response}");
}

#[tokio::test]
async fn shutdown_closes_open_connections() {
    let handle = start_server().await;
    let mut ws = connect(&handle, "alice").await;
    let registry = handle.registry().clone();

    handle.shutdown().await;

    let ended = tokio::time::timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_) | Message::Ping(_) | Message::Pong(_))) => continue,
                _ => break,
            }
        }
    })
    .await;
    assert!(ended.is_ok());
    assert_eq!(registry.connection_count(), 0);
}
