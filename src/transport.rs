//! UDP transport.
//!
//! Owns the socket and the receive loop; everything protocol-shaped lives
//! in [`crate::agent`]. The loop hands each datagram to the dispatcher and
//! sends back whatever bytes it returns, if any.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::error::Result;

/// Largest datagram the server reads. SNMP messages beyond this are
/// nonstandard; anything longer is truncated by the kernel and will fail
/// to decode, which the dispatcher absorbs.
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Create and bind a UDP socket with optional receive buffer size.
///
/// For IPv6 addresses, sets `IPV6_V6ONLY = false` so one socket serves
/// both families. To get dual-stack, bind `[::]:port`.
pub async fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    // Allow address reuse for quick restarts
    socket.set_reuse_address(true)?;

    // Kernel may cap the buffer at rmem_max; that is fine
    if let Some(size) = recv_buffer_size {
        let _ = socket.set_recv_buffer_size(size);
    }

    // Set non-blocking before converting to tokio socket
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// The UDP server: a socket plus the agent it feeds.
pub struct Server {
    socket: UdpSocket,
    agent: Arc<Agent>,
}

impl Server {
    /// Bind to `addr` and serve `agent`.
    pub async fn bind(addr: SocketAddr, agent: Arc<Agent>) -> Result<Self> {
        let socket = bind_udp_socket(addr, None).await?;
        info!(addr = %socket.local_addr()?, "listening");
        Ok(Self { socket, agent })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive-dispatch-respond loop. Runs until the task is dropped.
    ///
    /// Returns only on a socket-level receive error; per-packet failures
    /// never escape the dispatcher.
    pub async fn run(self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            let datagram = Bytes::copy_from_slice(&buf[..len]);

            match self.agent.handle_datagram(datagram) {
                Some(reply) => {
                    if let Err(error) = self.socket.send_to(&reply, peer).await {
                        warn!(%peer, %error, "failed to send response");
                    }
                }
                None => debug!(%peer, len, "no response for datagram"),
            }
        }
    }

    /// Send a prebuilt trap datagram to `dest`.
    pub async fn send_trap(&self, dest: SocketAddr, datagram: &[u8]) -> Result<()> {
        self.socket.send_to(datagram, dest).await?;
        Ok(())
    }
}
