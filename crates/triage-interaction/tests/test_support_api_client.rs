use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use triage_core::catalog::CatalogClient;
use triage_core::gateway::{ChatTurnRequest, MissingItemsRequest, SupportGateway};
use triage_interaction::SupportApiClient;

/// Serves exactly one HTTP response and hands back the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
            if let Some(header_end) = find_header_end(&request) {
                let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (base_url, handle)
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

#[tokio::test]
async fn test_fetch_categories() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"categories":[{"id":"order_quality_handler","name":"Order Quality & Accuracy"},{"id":"technical_handler","name":"Technical Issues"}]}"#,
    )
    .await;
    let client = SupportApiClient::new(&base_url).unwrap();

    let categories = client.categories("grab_food", "customer").await.unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("GET /api/categories/grab_food/customer "));
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Technical Issues");
}

#[tokio::test]
async fn test_chat_turn_posts_context() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"response":"Please upload a photo","requires_image":true,"image_request":"Photo of the food","conversation_id":"conv-1"}"#,
    )
    .await;
    let client = SupportApiClient::new(&base_url).unwrap();

    let reply = client
        .chat_turn(ChatTurnRequest {
            message: "My food was cold".into(),
            service: "grab_food".into(),
            user_type: "customer".into(),
            username: "alice".into(),
            conversation_id: "conv-1".into(),
            category: Some("order_quality_handler".into()),
            sub_issue: Some("handle_cold_food".into()),
            messages: Vec::new(),
            order_id: Some("ORD-1".into()),
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /api/chat "));
    assert!(request.contains(r#""conversation_id":"conv-1""#));
    assert!(request.contains(r#""sub_issue":"handle_cold_food""#));
    assert!(reply.requires_image);
    assert_eq!(reply.image_request.as_deref(), Some("Photo of the food"));
}

#[tokio::test]
async fn test_error_status_maps_to_upstream_error() {
    let (base_url, server) =
        serve_once("400 Bad Request", r#"{"error":"Missing required fields"}"#).await;
    let client = SupportApiClient::new(&base_url).unwrap();

    let err = client
        .missing_items_turn(MissingItemsRequest {
            message: "Missing items complaint".into(),
            username: "alice".into(),
            order_id: None,
        })
        .await
        .unwrap_err();
    let request = server.await.unwrap();

    assert!(request.starts_with("POST /api/missing-items "));
    assert_eq!(err, triage_core::TriageError::upstream(400, "Missing required fields"));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = SupportApiClient::new(&base_url).unwrap();
    let err = client.categories("grab_food", "customer").await.unwrap_err();
    assert!(matches!(err, triage_core::TriageError::Transport { .. }));
}
