//! WebhookNotifier - completion events over HTTP.
//!
//! Posts each [`CompletionEvent`] as JSON to a configured URL. Delivery is
//! best-effort: a non-200 answer is logged, transport failures are reported
//! to the dispatcher, and nothing is retried.

use async_trait::async_trait;
use medlens_core::config::WebhookConfig;
use medlens_core::notify::{CompletionEvent, CompletionNotifier};
use medlens_core::{MedlensError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Completion notifier that talks to an HTTP webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Builds a notifier from configuration, or `None` when no url is set.
    pub fn from_config(config: &WebhookConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let url = config.url.as_deref()?.trim();
        Some(Self::new(url, Duration::from_secs(config.timeout_secs)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionNotifier for WebhookNotifier {
    async fn notify(&self, event: &CompletionEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MedlensError::notification(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::OK {
            tracing::info!(
                "[Webhook] Sent successfully for {}",
                event.communication_id
            );
        } else {
            tracing::warn!(
                "[Webhook] Failed with status {} for {}",
                status.as_u16(),
                event.communication_id
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medlens_core::communication::AgentFramework;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn event() -> CompletionEvent {
        CompletionEvent {
            event: CompletionEvent::EVENT_NAME.to_string(),
            communication_id: "comm_1_abcdef12".to_string(),
            agent_name: "Dr. X".to_string(),
            framework: AgentFramework::Autogen,
            duration_seconds: 1.5,
            total_tokens: 80,
            cost_estimate: 0.0033,
            patient_id: Some("p1".to_string()),
            scenario_type: "assessment".to_string(),
        }
    }

    /// Accepts one request, answers with `status_line`, and returns the request body.
    async fn serve_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];

        let body_start = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let headers = String::from_utf8_lossy(&buffer[..body_start]).to_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse().unwrap())
            .unwrap_or(0);
        while buffer.len() < body_start + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buffer.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&buffer[body_start..body_start + content_length]).into_owned()
    }

    #[tokio::test]
    async fn test_posts_event_json() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "200 OK"));

        let notifier = WebhookNotifier::new(url, Duration::from_secs(5));
        notifier.notify(&event()).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["event"], "communication_completed");
        assert_eq!(body["communication_id"], "comm_1_abcdef12");
        assert_eq!(body["framework"], "autogen");
        assert_eq!(body["total_tokens"], 80);
        assert_eq!(body["patient_id"], "p1");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_not_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "500 Internal Server Error"));

        let notifier = WebhookNotifier::new(url, Duration::from_secs(5));
        assert!(notifier.notify(&event()).await.is_ok());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_notification_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = WebhookNotifier::new(format!("http://{addr}/hook"), Duration::from_secs(1));
        let err = notifier.notify(&event()).await.unwrap_err();
        assert!(matches!(err, MedlensError::Notification(_)));
    }

    #[test]
    fn test_from_config() {
        assert!(WebhookNotifier::from_config(&WebhookConfig::default()).is_none());

        let config = WebhookConfig {
            url: Some(" http://localhost:9000/hook ".to_string()),
            timeout_secs: 2,
            ..WebhookConfig::default()
        };
        let notifier = WebhookNotifier::from_config(&config).unwrap();
        assert_eq!(notifier.url(), "http://localhost:9000/hook");
        assert_eq!(notifier.timeout, Duration::from_secs(2));
    }
}
