//! UDP transport session
//!
//! Owns the socket lifecycle and the cooperative stop flag. The scheduler and
//! the dispatcher only see the [`Transport`] trait, so they can be driven by an
//! in-memory transport in tests.

use crate::config::ClientConfig;
use crate::types::{Result, RrefError};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Send/receive primitives used by the scheduler and the dispatcher
pub trait Transport {
    /// Best-effort, unacknowledged send to the simulator
    fn send(&mut self, packet: &[u8]) -> Result<()>;

    /// Receive one datagram, waiting at most the configured timeout
    ///
    /// Returns `RrefError::Timeout` when nothing arrived in time.
    fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Cooperative cancellation flag shared between the receive loop and a stop requester
///
/// Cloning shares the same flag. The loop checks it once per iteration, so a
/// stop takes effect within one receive timeout.
#[derive(Debug, Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a signal in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Request the loop to stop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// True until `stop` has been called on any clone
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// UDP endpoint talking to the simulator
pub struct UdpSession {
    socket: Option<UdpSocket>,
    sim_addr: SocketAddr,
    buffer: Vec<u8>,
    stop: StopSignal,
}

impl UdpSession {
    /// Bind the local endpoint described by `config`
    ///
    /// The socket is created with `SO_REUSEADDR` and the configured read
    /// timeout. A zero timeout is rejected up front; any socket failure is
    /// reported as `RrefError::Bind`.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        if config.receive_timeout().is_zero() {
            return Err(RrefError::ZeroReceiveTimeout);
        }

        let local_addr = config.local_addr()?;
        let sim_addr = config.sim_addr()?;

        let bind_err = |source: std::io::Error| RrefError::Bind {
            addr: local_addr.to_string(),
            source,
        };

        let socket = Socket::new(
            Domain::for_address(local_addr),
            Type::DGRAM,
            Some(Protocol::UDP),
        )
        .map_err(bind_err)?;

        socket.set_reuse_address(true).map_err(bind_err)?;
        socket
            .set_read_timeout(Some(config.receive_timeout()))
            .map_err(bind_err)?;
        socket.bind(&SockAddr::from(local_addr)).map_err(bind_err)?;

        let socket = UdpSocket::from(socket);
        log::info!(
            "UDP session open on {} (simulator at {})",
            socket.local_addr().map_err(bind_err)?,
            sim_addr
        );

        Ok(Self {
            socket: Some(socket),
            sim_addr,
            buffer: vec![0u8; config.receive_buffer_size],
            stop: StopSignal::new(),
        })
    }

    /// Address the socket is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket()?.local_addr()?)
    }

    /// Address requests are sent to
    pub fn sim_addr(&self) -> SocketAddr {
        self.sim_addr
    }

    /// Handle to the session's running flag
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Send a packet to an arbitrary address
    pub fn send_to(&self, packet: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket()?.send_to(packet, addr)?;
        Ok(())
    }

    /// True until `close` has been called
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Release the socket. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        self.stop.stop();
        if let Some(socket) = self.socket.take() {
            match socket.local_addr() {
                Ok(addr) => log::info!("UDP session on {} closed", addr),
                Err(_) => log::info!("UDP session closed"),
            }
        }
    }

    fn socket(&self) -> Result<&UdpSocket> {
        self.socket.as_ref().ok_or(RrefError::SessionClosed)
    }
}

impl Transport for UdpSession {
    fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.send_to(packet, self.sim_addr)
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(RrefError::SessionClosed)?;
        match socket.recv_from(&mut self.buffer) {
            Ok((len, from)) => {
                log::trace!("Received {} bytes from {}", len, from);
                Ok(self.buffer[..len].to_vec())
            }
            Err(e) => Err(recv_error(e)),
        }
    }
}

/// Classify a failed `recv_from` on a socket with a read timeout
///
/// Platforms report an expired timeout as either `WouldBlock` or `TimedOut`.
/// With `SO_RCVTIMEO` set, Linux does not restart `recvfrom` after a signal and
/// returns `EINTR`; that is also treated as a timeout so the caller goes back
/// to checking its stop flag.
pub(crate) fn recv_error(e: std::io::Error) -> RrefError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => RrefError::Timeout,
        _ => RrefError::Transport(e),
    }
}
