use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::events::{ClientEvent, ServerEvent};
use crate::session::SessionConfig;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Buffer between the socket tasks and the call loop in each direction.
const CHANNEL_CAPACITY: usize = 256;

const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// One realtime conversation with the model.
///
/// The socket is split into a writer task draining [`ClientEvent`]s and a
/// reader task parsing [`ServerEvent`]s; the owner talks to both through
/// bounded channels. Dropping the client closes the outbound channel, which
/// lets the writer close the socket.
#[derive(Debug)]
pub struct RealtimeClient {
    outbound: mpsc::Sender<ClientEvent>,
    inbound: mpsc::Receiver<ServerEvent>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RealtimeClient {
    /// Opens the realtime socket and configures the session.
    ///
    /// `session.update` is written before this returns, so it is always the
    /// first event the endpoint sees.
    pub async fn connect(config: &LlmConfig, session: SessionConfig) -> Result<Self, LlmError> {
        if !config.is_configured() {
            return Err(LlmError::Config(
                "LLM endpoint and API key are required".to_string(),
            ));
        }
        let url = config.realtime_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| LlmError::Connect(e.to_string()))?;
        let api_key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| LlmError::Config("API key is not a valid header value".to_string()))?;
        request.headers_mut().insert("api-key", api_key);

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let (stream, _response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| {
                LlmError::Connect(format!(
                    "handshake timed out after {}s",
                    config.connect_timeout_secs
                ))
            })?
            .map_err(|e| LlmError::Connect(e.to_string()))?;

        tracing::info!(
            host = url.host_str().unwrap_or_default(),
            deployment = %config.deployment,
            "connected to realtime endpoint"
        );

        let (mut sink, mut stream) = stream.split();

        let update = serde_json::to_string(&ClientEvent::SessionUpdate {
            session: Box::new(session),
        })?;
        sink.send(Message::Text(update.into()))
            .await
            .map_err(|e| LlmError::Connect(format!("failed to send session.update: {}", e)))?;

        let (outbound, mut outbound_rx) = mpsc::channel::<ClientEvent>(CHANNEL_CAPACITY);
        let writer = tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("failed to serialize realtime event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    tracing::warn!("realtime send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let (inbound_tx, inbound) = mpsc::channel::<ServerEvent>(CHANNEL_CAPACITY);
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                if inbound_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!("skipping unparseable realtime event: {}", e),
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(?frame, "realtime endpoint closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("realtime receive failed: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            outbound,
            inbound,
            writer,
            reader,
        })
    }

    /// Queues an event for the endpoint.
    pub async fn send(&self, event: ClientEvent) -> Result<(), LlmError> {
        self.outbound.send(event).await.map_err(|_| LlmError::Closed)
    }

    /// Next event from the endpoint, or `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.inbound.recv().await
    }

    /// Flushes queued events, closes the socket and stops both tasks.
    pub async fn disconnect(self) {
        let Self {
            outbound,
            inbound,
            writer,
            reader,
        } = self;
        drop(outbound);
        drop(inbound);
        if tokio::time::timeout(DISCONNECT_GRACE, writer).await.is_err() {
            tracing::debug!("realtime writer did not finish within grace period");
        }
        reader.abort();
    }
}
