use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::models::{Banner, Conversation, Message, SendMessageBody};
use crate::error::ApiError;

/// The remote conversational service as the controllers see it.
///
/// Every call is a single request/response; there is no push channel.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Health check against the API root. Returns the server banner.
    async fn ping(&self) -> Result<String, ApiError>;

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Messages of one conversation, oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;

    /// Post a user message. The response body is not interpreted.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ApiError>;
}

pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(&Self::base_api(base_url))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.ends_with("/api") { trimmed.to_string() } else { format!("{}/api", trimmed) }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ConversationApi for ApiClient {
    async fn ping(&self) -> Result<String, ApiError> {
        let banner: Banner = self.get_json(self.endpoint(&[""])?).await?;
        Ok(banner.message)
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(self.endpoint(&["chats"])?).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.get_json(self.endpoint(&["chats", conversation_id, "messages"])?)
            .await
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["chats", conversation_id, "messages"])?;
        debug!("POST {}", url);
        let body = SendMessageBody {
            chat_id: conversation_id,
            content: text,
        };
        let resp = self.http.post(url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Accepts one connection, answers it with `status` and `body`, and
    /// yields the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    if request.len() >= end + 4 + content_length(&text[..end]) {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), server)
    }

    #[test]
    fn appends_api_prefix_once() {
        assert_eq!(client("http://localhost:8001").base().as_str(), "http://localhost:8001/api");
        assert_eq!(client("http://localhost:8001/").base().as_str(), "http://localhost:8001/api");
        assert_eq!(client("https://chat.example/api/").base().as_str(), "https://chat.example/api");
    }

    #[test]
    fn builds_endpoints_under_api() {
        let c = client("http://localhost:8001");
        assert_eq!(c.endpoint(&[""]).unwrap().as_str(), "http://localhost:8001/api/");
        assert_eq!(c.endpoint(&["chats"]).unwrap().as_str(), "http://localhost:8001/api/chats");
        assert_eq!(
            c.endpoint(&["chats", "c-1", "messages"]).unwrap().as_str(),
            "http://localhost:8001/api/chats/c-1/messages"
        );
    }

    #[test]
    fn escapes_conversation_ids() {
        let c = client("http://localhost:8001");
        assert_eq!(
            c.endpoint(&["chats", "a b/c", "messages"]).unwrap().as_str(),
            "http://localhost:8001/api/chats/a%20b%2Fc/messages"
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::Url(_))
        ));
    }

    #[test]
    fn send_body_matches_backend_schema() {
        let body = SendMessageBody {
            chat_id: "c-1",
            content: "hello",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"chat_id": "c-1", "content": "hello"})
        );
    }

    #[tokio::test]
    async fn lists_conversations_from_the_server() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id": "c1", "name": "Maya", "avatar": "", "description": "",
                 "last_message": "hi", "last_message_time": "2024-03-10T09:05:00",
                 "last_seen": "online", "unread_count": 3}]"#,
        )
        .await;

        let chats = client(&base).list_conversations().await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, "c1");
        assert_eq!(chats[0].unread_count, 3);
        assert!(server.await.unwrap().starts_with("GET /api/chats HTTP/1.1"));
    }

    #[tokio::test]
    async fn server_error_status_is_reported() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#).await;

        let err = client(&base).list_conversations().await.unwrap_err();
        assert!(matches!(err, ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)), "{err:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (base, server) = serve_once("200 OK", "not json").await;

        let err = client(&base).list_messages("c").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
        assert!(server.await.unwrap().starts_with("GET /api/chats/c/messages HTTP/1.1"));
    }

    #[tokio::test]
    async fn rejected_send_is_a_status_error() {
        let (base, server) = serve_once("404 Not Found", r#"{"detail": "Chat not found"}"#).await;

        let err = client(&base).send_message("c", "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::Status(StatusCode::NOT_FOUND)), "{err:?}");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/chats/c/messages HTTP/1.1"));
        assert!(request.ends_with(r#"{"chat_id":"c","content":"hi"}"#));
    }

    #[tokio::test]
    async fn accepted_send_ignores_the_response_body() {
        let (base, server) = serve_once("200 OK", "not json").await;

        client(&base).send_message("c", "hi").await.unwrap();
        server.await.unwrap();
    }
}
