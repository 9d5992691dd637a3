//! Message channels carrying OSC packets to and from display endpoints.

use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::osc::{OscError, OscMessage};

/// URL scheme accepted in front of `host:port` targets.
pub const OSC_UDP_SCHEME: &str = "osc-udp://";

/// Largest datagram read from a control socket.
const RECV_BUFFER_SIZE: usize = 2048;

/// Transmission errors. These are never fatal to playback.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error("Invalid endpoint address {0:?}")]
    Address(String),
    #[error("Channel {0} has no send target")]
    NoTarget(String),
    #[error("Malformed packet: {0}")]
    Decode(#[from] OscError),
    #[error("Socket error: {0}")]
    Io(#[from] io::Error),
}

/// A best-effort, bidirectional OSC message channel.
pub trait MessageChannel {
    /// Human readable endpoint name for logs.
    fn name(&self) -> &str;

    /// Send one message. No acknowledgment, no retry.
    fn send(&mut self, message: &OscMessage) -> Result<(), TransmitError>;

    /// Next inbound message, if one is waiting. Never blocks.
    fn try_recv(&mut self) -> Result<Option<OscMessage>, TransmitError>;
}

impl<T: MessageChannel + ?Sized> MessageChannel for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, message: &OscMessage) -> Result<(), TransmitError> {
        (**self).send(message)
    }

    fn try_recv(&mut self) -> Result<Option<OscMessage>, TransmitError> {
        (**self).try_recv()
    }
}

/// Resolve `osc-udp://host:port` or plain `host:port`.
pub fn parse_endpoint(target: &str) -> Result<SocketAddr, TransmitError> {
    let addr = target.strip_prefix(OSC_UDP_SCHEME).unwrap_or(target);
    addr.to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| TransmitError::Address(target.to_owned()))
}

/// OSC over UDP.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    target: Option<SocketAddr>,
    name: String,
    recv_buffer: Vec<u8>,
}

impl UdpChannel {
    /// Open an ephemeral socket that sends to `target`.
    pub fn connect(target: &str) -> Result<Self, TransmitError> {
        let addr = parse_endpoint(target)?;
        let bind: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;
        log::info!("Sending to {}", addr);

        Ok(Self {
            socket,
            target: Some(addr),
            name: target.to_owned(),
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    /// Bind a receive-only socket, e.g. for remote control messages.
    pub fn listen(bind: &str) -> Result<Self, TransmitError> {
        let addr = parse_endpoint(bind)?;
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!("Listening for control messages on {}", addr);

        Ok(Self {
            socket,
            target: None,
            name: bind.to_owned(),
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl MessageChannel for UdpChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &OscMessage) -> Result<(), TransmitError> {
        let target = self
            .target
            .ok_or_else(|| TransmitError::NoTarget(self.name.clone()))?;
        self.socket.send_to(&message.encode(), target)?;
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<OscMessage>, TransmitError> {
        match self.socket.recv_from(&mut self.recv_buffer) {
            Ok((len, _from)) => Ok(Some(OscMessage::decode(&self.recv_buffer[..len])?)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    sent: Vec<OscMessage>,
    inbound: VecDeque<OscMessage>,
}

/// In-process channel that records what is sent and replays queued inbound
/// messages. Clones share state, so a clone kept aside can inspect traffic.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    name: String,
    state: Arc<Mutex<MemoryState>>,
    failing: Arc<AtomicBool>,
}

impl MemoryChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<OscMessage> {
        self.state().sent.clone()
    }

    /// Queue a message for `try_recv`.
    pub fn inject(&self, message: OscMessage) {
        self.state().inbound.push_back(message);
    }

    /// Make every following `send` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl MessageChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &OscMessage) -> Result<(), TransmitError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(TransmitError::Io(io::Error::other("simulated send failure")));
        }
        self.state().sent.push(message.clone());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<OscMessage>, TransmitError> {
        Ok(self.state().inbound.pop_front())
    }
}
