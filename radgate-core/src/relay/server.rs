use crate::context::AuthContext;
use crate::relay::session::{ConnectionTable, Session};
use radgate_common::{RelayConfig, RelayError, Result, DATAGRAM_BUFFER_SIZE};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Transparent relay between clients and the upstream authority.
///
/// Every client address gets its own upstream socket, so replies can be routed
/// back without parsing them. Forwarded datagrams are sent byte for byte.
pub struct RelayServer {
    socket: Arc<UdpSocket>,
    table: Arc<ConnectionTable>,
    context: Arc<AuthContext>,
}

impl RelayServer {
    /// Bind `0.0.0.0:<listen port>` and resolve the upstream authority.
    pub async fn bind(config: &RelayConfig, context: Arc<AuthContext>) -> Result<Self> {
        let upstream = resolve_upstream(&config.upstream()).await?;
        let listen = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listen_port()));
        let socket = UdpSocket::bind(listen).await?;
        info!(listen = %socket.local_addr()?, upstream = %upstream, "Relay bound");
        Ok(Self {
            socket: Arc::new(socket),
            table: Arc::new(ConnectionTable::new(upstream)),
            context,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn table(&self) -> &ConnectionTable {
        &self.table
    }

    /// Reset the connection table, then reload every plugin.
    pub fn reload(&self) {
        let dropped = self.table.reset();
        self.context.reload();
        info!(sessions = dropped, "Relay reloaded");
        #[cfg(feature = "metrics")]
        if let Some(m) = radgate_observability::relay_metrics() {
            m.reloads.inc();
            m.sessions_active.set(0);
        }
    }

    /// Serve until the task is dropped. Transport errors are logged and skipped.
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; DATAGRAM_BUFFER_SIZE];
        loop {
            let (len, client) = match self.socket.recv_from(&mut buf).await {
                Ok(read) => read,
                Err(e) => {
                    warn!(error = %e, "Unable to read datagram");
                    continue;
                }
            };

            #[cfg(feature = "metrics")]
            if let Some(m) = radgate_observability::relay_metrics() {
                m.record_received("auth");
            }

            let session = match self.table.get_or_create(client) {
                Ok((session, created)) => {
                    if created {
                        debug!(client = %client, "New session");
                        self.spawn_reader(session.clone());
                        #[cfg(feature = "metrics")]
                        if let Some(m) = radgate_observability::relay_metrics() {
                            m.sessions_active.set(i64::try_from(self.table.len()).unwrap_or(i64::MAX));
                        }
                    }
                    session
                }
                Err(e) => {
                    warn!(client = %client, error = %e, "Unable to dial upstream");
                    continue;
                }
            };

            let datagram = &buf[..len];
            if !self.context.authorize(datagram).await {
                debug!(client = %client, "Dropped denied datagram");
                #[cfg(feature = "metrics")]
                if let Some(m) = radgate_observability::relay_metrics() {
                    m.packets_denied.inc();
                }
                continue;
            }

            match session.upstream().send(datagram).await {
                Ok(_) => {
                    #[cfg(feature = "metrics")]
                    if let Some(m) = radgate_observability::relay_metrics() {
                        m.packets_forwarded.inc();
                    }
                }
                Err(e) => warn!(client = %client, error = %e, "Unable to forward datagram"),
            }
        }
    }

    /// Relay upstream replies for `session` until it is cancelled.
    fn spawn_reader(&self, session: Arc<Session>) {
        let socket = self.socket.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; DATAGRAM_BUFFER_SIZE];
            loop {
                tokio::select! {
                    () = session.cancelled() => {
                        debug!(client = %session.client(), "Session reader stopped");
                        break;
                    }
                    read = session.upstream().recv(&mut buf) => match read {
                        Ok(len) => {
                            if let Err(e) = socket.send_to(&buf[..len], session.client()).await {
                                warn!(client = %session.client(), error = %e, "Unable to relay reply");
                                continue;
                            }
                            #[cfg(feature = "metrics")]
                            if let Some(m) = radgate_observability::relay_metrics() {
                                m.replies_relayed.inc();
                            }
                        }
                        Err(e) => {
                            warn!(client = %session.client(), error = %e, "Unable to read upstream reply");
                        }
                    }
                }
            }
        });
    }
}

/// First address for `target`, preferring IPv4.
pub async fn resolve_upstream(target: &str) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(target)
        .await
        .map_err(|e| RelayError::Resolve(format!("{target}: {e}")))?
        .collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| RelayError::Resolve(format!("{target}: no addresses")))
}
