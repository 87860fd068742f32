use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use radgate_common::Result;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A client's dedicated path to the upstream authority
#[derive(Debug)]
pub struct Session {
    client: SocketAddr,
    upstream: UdpSocket,
    cancel: CancellationToken,
}

impl Session {
    /// Open an ephemeral socket connected to `upstream`. Must run inside a Tokio runtime.
    pub fn dial(client: SocketAddr, upstream: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if upstream.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = std::net::UdpSocket::bind(local)?;
        socket.connect(upstream)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            client,
            upstream: UdpSocket::from_std(socket)?,
            cancel: CancellationToken::new(),
        })
    }

    pub fn client(&self) -> SocketAddr {
        self.client
    }

    pub fn upstream(&self) -> &UdpSocket {
        &self.upstream
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the session has been discarded
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// Client address to session map
#[derive(Debug)]
pub struct ConnectionTable {
    upstream: SocketAddr,
    sessions: DashMap<SocketAddr, Arc<Session>>,
}

impl ConnectionTable {
    pub fn new(upstream: SocketAddr) -> Self {
        Self {
            upstream,
            sessions: DashMap::new(),
        }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }

    /// Existing session for `client`, or a freshly dialed one.
    ///
    /// The flag is `true` when the session was created by this call, in which
    /// case the caller owns starting its reader. A failed dial stores nothing.
    pub fn get_or_create(&self, client: SocketAddr) -> Result<(Arc<Session>, bool)> {
        match self.sessions.entry(client) {
            Entry::Occupied(entry) => Ok((entry.get().clone(), false)),
            Entry::Vacant(entry) => {
                let session = Arc::new(Session::dial(client, self.upstream)?);
                entry.insert(session.clone());
                Ok((session, true))
            }
        }
    }

    pub fn get(&self, client: &SocketAddr) -> Option<Arc<Session>> {
        self.sessions.get(client).map(|s| s.value().clone())
    }

    /// Drop every session and cancel its reader. Returns how many were dropped.
    pub fn reset(&self) -> usize {
        let mut dropped = 0;
        self.sessions.retain(|_, session| {
            session.cancel();
            dropped += 1;
            false
        });
        dropped
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ConnectionTable {
        ConnectionTable::new("127.0.0.1:1814".parse().unwrap())
    }

    #[tokio::test]
    async fn test_one_session_per_client() {
        let table = table();
        let a: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:5001".parse().unwrap();

        let (first, created) = table.get_or_create(a).unwrap();
        assert!(created);
        let (again, created) = table.get_or_create(a).unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));

        let (other, created) = table.get_or_create(b).unwrap();
        assert!(created);
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(table.len(), 2);
        assert_eq!(first.client(), a);
        assert_eq!(
            first.upstream().peer_addr().unwrap(),
            "127.0.0.1:1814".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_reset_cancels_sessions() {
        let table = table();
        let (session, _) = table
            .get_or_create("127.0.0.1:5002".parse().unwrap())
            .unwrap();
        table
            .get_or_create("127.0.0.1:5003".parse().unwrap())
            .unwrap();

        assert_eq!(table.reset(), 2);
        assert!(table.is_empty());
        assert!(session.is_cancelled());
        session.cancelled().await;

        let (fresh, created) = table.get_or_create(session.client()).unwrap();
        assert!(created);
        assert!(!fresh.is_cancelled());
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_session() {
        let table = Arc::new(table());
        let client: SocketAddr = "127.0.0.1:5004".parse().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = table.clone();
                tokio::spawn(async move { table.get_or_create(client).unwrap() })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().1 {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(table.len(), 1);
    }
}
