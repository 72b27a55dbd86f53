//! Non-blocking UDP endpoint with rebind-on-failure
//!
//! An [`Endpoint`] wraps one UDP socket bound to `0.0.0.0:<port>` with
//! broadcast enabled. A bind failure (typically address-in-use) is logged
//! and leaves the endpoint unbound: every operation on it is then a no-op
//! until something triggers a rebind. There is no automatic bind retry.
//!
//! Receives never block: [`Endpoint::drain`] polls with `try_recv_from`
//! until the socket reports nothing pending, so one call consumes an entire
//! burst of datagrams. A receive that fails with the disconnect class
//! rebuilds the socket and keeps draining; any other receive error aborts
//! the current poll pass.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use super::wire::{MAX_DATAGRAM, decode_key};
use super::is_disconnect;

/// One non-blocking UDP socket, rebuilt in place on disconnect-class errors
#[derive(Debug)]
pub struct Endpoint {
    /// Role tag for log lines ("publish" or "subscribe")
    name: &'static str,
    port: u16,
    socket: Option<UdpSocket>,
}

impl Endpoint {
    /// Bind a new endpoint on `0.0.0.0:<port>`
    ///
    /// Returns an endpoint even when the bind fails; the failure is logged
    /// and the endpoint stays unbound.
    pub async fn bind(name: &'static str, port: u16) -> Self {
        let mut endpoint = Self {
            name,
            port,
            socket: None,
        };
        endpoint.rebind().await;
        endpoint
    }

    /// Rebuild and rebind the socket in place
    pub async fn rebind(&mut self) {
        match Self::open(self.port).await {
            Ok(socket) => {
                // Port 0 means "ephemeral", report what we actually got.
                let bound = socket
                    .local_addr()
                    .map_or(self.port, |addr| addr.port());
                info!(endpoint = self.name, port = bound, "Bound endpoint");
                self.socket = Some(socket);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                error!(
                    endpoint = self.name,
                    port = self.port,
                    "Unable to bind, address already in use"
                );
                self.socket = None;
            }
            Err(e) => {
                error!(endpoint = self.name, port = self.port, error = %e, "Unable to bind");
                self.socket = None;
            }
        }
    }

    async fn open(port: u16) -> io::Result<UdpSocket> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        socket.set_broadcast(true)?;
        Ok(socket)
    }

    /// Whether the endpoint currently holds a bound socket
    pub fn is_bound(&self) -> bool {
        self.socket.is_some()
    }

    /// The locally bound address, if any
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub(crate) fn socket(&self) -> Option<&UdpSocket> {
        self.socket.as_ref()
    }

    /// Drain every pending datagram, decoded as (key, sender)
    ///
    /// Returns once the socket reports nothing pending, or after a
    /// non-recoverable receive error (logged). Disconnect-class errors
    /// rebuild the socket and continue draining.
    pub async fn drain(&mut self) -> Vec<(String, SocketAddr)> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let mut received = Vec::new();

        loop {
            let Some(socket) = self.socket.as_ref() else {
                return received;
            };

            match socket.try_recv_from(&mut buf) {
                Ok((len, from)) => {
                    debug!(
                        endpoint = self.name,
                        bytes = len,
                        %from,
                        "Received datagram"
                    );
                    received.push((decode_key(&buf[..len]), from));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return received,
                Err(e) if is_disconnect(&e) => {
                    error!(
                        endpoint = self.name,
                        port = self.port,
                        "Socket is not connected/shut down, attempting to bind again"
                    );
                    self.rebind().await;
                }
                Err(e) => {
                    warn!(endpoint = self.name, error = %e, "Receive failed, aborting poll pass");
                    return received;
                }
            }
        }
    }
}
