//! `LlmClient` against a local stub of the chat-completions endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use refcheck_extract::{ApiKey, ExtractError, LlmClient, extract_references};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned response and capture the raw request.
async fn serve_once(status: u16, body: &'static str) -> (SocketAddr, Arc<Mutex<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(String::new()));
    let captured_clone = captured.clone();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + content_length {
                    break;
                }
            }
        }
        *captured_clone.lock().unwrap() = String::from_utf8_lossy(&buf).into_owned();

        let response = format!(
            "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    (addr, captured)
}

fn client(addr: SocketAddr) -> LlmClient {
    LlmClient::new(
        reqwest::Client::new(),
        format!("http://{addr}/api/v1/chat/completions"),
        "some/model",
        ApiKey::new("sk-test-key").unwrap(),
    )
}

#[tokio::test]
async fn first_choice_content_is_parsed() {
    let (addr, captured) = serve_once(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"```json\n[{\"title\":\"Deep Learning\",\"authors\":[\"Ian Goodfellow\"],\"year\":2016}]\n```"}}]}"#,
    )
    .await;

    let extraction = extract_references(&client(addr), "Bibliography ...", 12_000)
        .await
        .unwrap();

    assert_eq!(extraction.references.len(), 1);
    assert_eq!(extraction.references[0].title(), Some("Deep Learning"));

    let request = captured.lock().unwrap().clone();
    assert!(request.starts_with("POST /api/v1/chat/completions"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test-key"));
    assert!(request.contains("\"model\":\"some/model\""));
}

#[tokio::test]
async fn error_status_is_reported() {
    let (addr, _) = serve_once(401, r#"{"error":{"message":"No auth"}}"#).await;

    let err = extract_references(&client(addr), "text", 12_000)
        .await
        .unwrap_err();

    match err {
        ExtractError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("No auth"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_choices_is_empty_response() {
    let (addr, _) = serve_once(200, r#"{"choices":[]}"#).await;

    let err = extract_references(&client(addr), "text", 12_000)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::EmptyResponse));
}
