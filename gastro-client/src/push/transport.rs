use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use shared::message::{BusMessage, EventType};
use shared::{PushError, PushResult};

/// Transport abstraction for push-channel communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> PushResult<BusMessage>;
    async fn write_message(&self, msg: &BusMessage) -> PushResult<()>;
    async fn close(&self) -> PushResult<()>;
}

/// TCP Transport Implementation
///
/// Frame layout: event type (1 byte), request id (16 bytes),
/// payload length (4 bytes, LE), JSON payload.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> PushResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| PushError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> PushResult<BusMessage> {
        let mut reader = self.reader.lock().await;

        // Read event type (1 byte)
        let mut type_buf = [0u8; 1];
        reader
            .read_exact(&mut type_buf)
            .await
            .map_err(PushError::Io)?;

        let event_type = EventType::try_from(type_buf[0])
            .map_err(|_| PushError::InvalidMessage("Invalid event type".into()))?;

        // Read request id (16 bytes)
        let mut uuid_buf = [0u8; 16];
        reader
            .read_exact(&mut uuid_buf)
            .await
            .map_err(PushError::Io)?;
        let request_id = Uuid::from_bytes(uuid_buf);

        // Read payload length (4 bytes)
        let mut len_buf = [0u8; 4];
        reader
            .read_exact(&mut len_buf)
            .await
            .map_err(PushError::Io)?;

        let len = u32::from_le_bytes(len_buf) as usize;

        // Read payload
        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(PushError::Io)?;

        Ok(BusMessage {
            request_id,
            event_type,
            payload,
        })
    }

    async fn write_message(&self, msg: &BusMessage) -> PushResult<()> {
        let mut writer = self.writer.lock().await;
        let mut data = Vec::new();
        data.push(msg.event_type as u8);
        data.extend_from_slice(msg.request_id.as_bytes());
        data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&msg.payload);

        writer.write_all(&data).await.map_err(PushError::Io)?;
        Ok(())
    }

    async fn close(&self) -> PushResult<()> {
        // Dropping the Arc references will eventually close the stream
        Ok(())
    }
}

/// Memory Transport Implementation (for in-process communication)
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Receiver for messages FROM the server (broadcasts)
    rx: Arc<Mutex<broadcast::Receiver<BusMessage>>>,
    /// Sender for messages TO the server
    tx: broadcast::Sender<BusMessage>,
}

impl MemoryTransport {
    /// Create a new memory transport
    ///
    /// # Arguments
    /// * `server_broadcast_tx` - The server's broadcast sender (to subscribe to updates)
    /// * `client_to_server_tx` - The channel to send messages TO the server
    pub fn new(
        server_broadcast_tx: &broadcast::Sender<BusMessage>,
        client_to_server_tx: &broadcast::Sender<BusMessage>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(server_broadcast_tx.subscribe())),
            tx: client_to_server_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> PushResult<BusMessage> {
        let mut rx = self.rx.lock().await;
        loop {
            match rx.recv().await {
                Ok(msg) => return Ok(msg),
                // A slow reader only misses doorbells; the next one
                // re-fetches the full collection anyway.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Memory transport lagged, skipped {} messages", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(PushError::Connection("Memory channel closed".into()));
                }
            }
        }
    }

    async fn write_message(&self, msg: &BusMessage) -> PushResult<()> {
        self.tx
            .send(msg.clone())
            .map_err(|e| PushError::Connection(format!("Failed to send to server: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> PushResult<()> {
        Ok(())
    }
}
