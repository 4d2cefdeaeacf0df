//! Telegram notifier against an in-process mock of the Bot API

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use failover_core::traits::Notifier;
use failover_core::Error;
use failover_notify_telegram::TelegramNotifier;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const TOKEN: &str = "123:abc";

#[derive(Clone, Default)]
struct MockBot {
    messages: Arc<Mutex<Vec<Value>>>,
}

async fn send_message(
    State(bot): State<MockBot>,
    Path(bot_path): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if bot_path != format!("bot{}", TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"})),
        );
    }
    if body["chat_id"] == "missing" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})),
        );
    }

    bot.messages.lock().unwrap().push(body);
    (StatusCode::OK, Json(json!({"ok": true, "result": {"message_id": 1}})))
}

async fn spawn_mock(bot: MockBot) -> String {
    let app = Router::new()
        .route("/:bot/sendMessage", post(send_message))
        .with_state(bot);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn message_is_posted_to_chat() {
    let bot = MockBot::default();
    let base = spawn_mock(bot.clone()).await;

    let notifier = TelegramNotifier::new(TOKEN, "42").unwrap().with_api_base(base);
    notifier.notify("DNS switched to 192.0.2.2").await.unwrap();

    let messages = bot.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0],
        json!({"chat_id": "42", "text": "DNS switched to 192.0.2.2"})
    );
}

#[tokio::test]
async fn wrong_token_is_authentication_error() {
    let base = spawn_mock(MockBot::default()).await;

    let notifier = TelegramNotifier::new("999:wrong", "42").unwrap().with_api_base(base);
    let err = notifier.notify("hello").await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn api_rejection_is_notifier_error_with_description() {
    let base = spawn_mock(MockBot::default()).await;

    let notifier = TelegramNotifier::new(TOKEN, "missing").unwrap().with_api_base(base);
    let err = notifier.notify("hello").await.unwrap_err();

    match err {
        Error::Notifier(message) => assert!(message.contains("chat not found")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn transport_error_does_not_leak_token() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier = TelegramNotifier::new("123:very-secret", "42")
        .unwrap()
        .with_api_base(format!("http://{}", addr));
    let err = notifier.notify("hello").await.unwrap_err();

    assert!(matches!(err, Error::Notifier(_)));
    assert!(!err.to_string().contains("very-secret"));
}
