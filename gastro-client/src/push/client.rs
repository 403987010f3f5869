use crate::push::transport::{MemoryTransport, TcpTransport, Transport};
use shared::message::{BusMessage, HandshakePayload, PROTOCOL_VERSION};
use shared::{PushError, PushResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};

/// Push Client
///
/// Maintains the persistent server-to-client event subscription.
/// Messages are fanned out on a broadcast channel; connection state is
/// published on a watch channel so ingestion can resynchronize after a
/// reconnect.
#[derive(Debug, Clone)]
pub struct PushClient {
    endpoint: PushEndpoint,
    client_name: String,
    current: Arc<Mutex<ClientTransport>>,
    /// Bumped on every (re)connect; stale read loops compare against it
    epoch: Arc<AtomicU64>,
    event_tx: broadcast::Sender<BusMessage>,
    connected_tx: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Clone)]
enum PushEndpoint {
    Tcp(String),
    Memory {
        server_tx: broadcast::Sender<BusMessage>,
        client_tx: broadcast::Sender<BusMessage>,
    },
}

#[derive(Debug, Clone)]
enum ClientTransport {
    Tcp(TcpTransport),
    Memory(MemoryTransport),
}

impl ClientTransport {
    async fn read_message(&self) -> PushResult<BusMessage> {
        match self {
            ClientTransport::Tcp(t) => t.read_message().await,
            ClientTransport::Memory(t) => t.read_message().await,
        }
    }

    async fn write_message(&self, msg: &BusMessage) -> PushResult<()> {
        match self {
            ClientTransport::Tcp(t) => t.write_message(msg).await,
            ClientTransport::Memory(t) => t.write_message(msg).await,
        }
    }

    async fn close(&self) -> PushResult<()> {
        match self {
            ClientTransport::Tcp(t) => t.close().await,
            ClientTransport::Memory(t) => t.close().await,
        }
    }
}

impl PushClient {
    /// Connect via TCP
    pub async fn connect(addr: &str, client_name: &str) -> PushResult<Self> {
        let transport = ClientTransport::Tcp(TcpTransport::connect(addr).await?);
        handshake(&transport, client_name).await?;
        Ok(Self::from_transport(
            PushEndpoint::Tcp(addr.to_string()),
            transport,
            client_name,
        ))
    }

    /// Create an in-memory client (tests and in-process wiring)
    pub fn memory(
        server_broadcast_tx: &broadcast::Sender<BusMessage>,
        client_to_server_tx: &broadcast::Sender<BusMessage>,
        client_name: &str,
    ) -> Self {
        let transport =
            ClientTransport::Memory(MemoryTransport::new(server_broadcast_tx, client_to_server_tx));
        Self::from_transport(
            PushEndpoint::Memory {
                server_tx: server_broadcast_tx.clone(),
                client_tx: client_to_server_tx.clone(),
            },
            transport,
            client_name,
        )
    }

    /// Create a dormant client that never delivers events (poll-only mode)
    pub fn detached() -> Self {
        let (server_tx, _) = broadcast::channel(8);
        let (client_tx, _) = broadcast::channel(8);
        Self::memory(&server_tx, &client_tx, "detached")
    }

    fn from_transport(
        endpoint: PushEndpoint,
        transport: ClientTransport,
        client_name: &str,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        let (connected_tx, _) = watch::channel(true);

        let client = Self {
            endpoint,
            client_name: client_name.to_string(),
            current: Arc::new(Mutex::new(transport.clone())),
            epoch: Arc::new(AtomicU64::new(0)),
            event_tx,
            connected_tx: Arc::new(connected_tx),
        };

        client.spawn_read_loop(transport, 0);
        client
    }

    fn spawn_read_loop(&self, transport: ClientTransport, epoch: u64) {
        let event_tx = self.event_tx.clone();
        let connected_tx = self.connected_tx.clone();
        let current_epoch = self.epoch.clone();

        tokio::spawn(async move {
            loop {
                match transport.read_message().await {
                    Ok(msg) => {
                        if let Err(e) = event_tx.send(msg) {
                            tracing::debug!("No subscribers for push event: {}", e);
                        }
                    }
                    Err(e) => {
                        // Only the read loop of the live transport may
                        // report a disconnect; superseded loops just exit.
                        if current_epoch.load(Ordering::SeqCst) == epoch {
                            tracing::error!("Push channel read error: {}", e);
                            connected_tx.send_replace(false);
                        }
                        break;
                    }
                }
            }
        });
    }

    /// Re-dial the endpoint and resume the event stream
    pub async fn reconnect(&self) -> PushResult<()> {
        let transport = match &self.endpoint {
            PushEndpoint::Tcp(addr) => {
                let t = ClientTransport::Tcp(TcpTransport::connect(addr).await?);
                handshake(&t, &self.client_name).await?;
                t
            }
            PushEndpoint::Memory {
                server_tx,
                client_tx,
            } => ClientTransport::Memory(MemoryTransport::new(server_tx, client_tx)),
        };

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.current.lock().unwrap() = transport.clone();
        self.spawn_read_loop(transport, epoch);
        self.connected_tx.send_replace(true);
        Ok(())
    }

    /// Subscribe to push events
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.event_tx.subscribe()
    }

    /// Watch connection state transitions
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    /// Whether the channel is currently connected
    pub fn is_connected(&self) -> bool {
        *self.connected_tx.borrow()
    }

    /// Close the push channel
    pub async fn close(&self) -> PushResult<()> {
        // Invalidate the live read loop before closing so the resulting
        // read error is not reported as an unexpected disconnect.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.connected_tx.send_replace(false);
        let transport = self.current.lock().unwrap().clone();
        transport.close().await
    }
}

async fn handshake(transport: &ClientTransport, client_name: &str) -> PushResult<()> {
    let payload = HandshakePayload {
        version: PROTOCOL_VERSION,
        client_name: Some(client_name.to_string()),
        client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    // Best-effort on memory transports: the harness may not be listening yet
    match transport.write_message(&BusMessage::handshake(&payload)).await {
        Ok(()) => Ok(()),
        Err(e) => match transport {
            ClientTransport::Memory(_) => {
                tracing::debug!("Handshake not delivered on memory transport: {}", e);
                Ok(())
            }
            ClientTransport::Tcp(_) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventType;

    #[tokio::test]
    async fn test_memory_client_receives_events() {
        let (server_tx, _keep) = broadcast::channel(16);
        let (client_tx, _server_rx) = broadcast::channel(16);
        let client = PushClient::memory(&server_tx, &client_tx, "test-client");

        let mut events = client.subscribe();
        server_tx.send(BusMessage::update(EventType::OrderUpdate)).unwrap();

        let msg = events.recv().await.unwrap();
        assert_eq!(msg.event_type, EventType::OrderUpdate);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_close_marks_disconnected() {
        let client = PushClient::detached();
        assert!(client.is_connected());

        client.close().await.unwrap();
        assert!(!client.is_connected());
    }
}
