use crate::context::AuthContext;
use radgate_common::{RelayConfig, Result, DATAGRAM_BUFFER_SIZE};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{info, warn};

/// Accounting sink: hands every datagram to the accounting plugins and never
/// forwards or replies.
pub struct AccountingServer {
    socket: UdpSocket,
    context: Arc<AuthContext>,
}

impl AccountingServer {
    pub async fn bind(config: &RelayConfig, context: Arc<AuthContext>) -> Result<Self> {
        let listen = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listen_port()));
        let socket = UdpSocket::bind(listen).await?;
        info!(listen = %socket.local_addr()?, "Accounting bound");
        Ok(Self { socket, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn reload(&self) {
        self.context.reload();
        info!("Accounting reloaded");
        #[cfg(feature = "metrics")]
        if let Some(m) = radgate_observability::relay_metrics() {
            m.reloads.inc();
        }
    }

    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; DATAGRAM_BUFFER_SIZE];
        loop {
            let len = match self.socket.recv_from(&mut buf).await {
                Ok((len, _)) => len,
                Err(e) => {
                    warn!(error = %e, "Unable to read datagram");
                    continue;
                }
            };
            #[cfg(feature = "metrics")]
            if let Some(m) = radgate_observability::relay_metrics() {
                m.record_received("accounting");
            }
            self.context.account(&buf[..len]).await;
        }
    }
}
