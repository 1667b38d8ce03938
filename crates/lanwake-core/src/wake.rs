//! Wake Dispatch - sends Wake-on-LAN magic packets to registered devices
//!
//! A sent packet is not an acknowledgement: Wake-on-LAN rides on
//! unacknowledged broadcast UDP, so success means "signal sent", never
//! "device woken".

use crate::directory::DeviceDirectory;
use crate::error::{Error, Result};
use crate::mac::{format_mac, parse_mac_address, MAC_LEN};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Default WoL port
pub const DEFAULT_WOL_PORT: u16 = 9;

/// Broadcast address for WoL
pub const BROADCAST_ADDR: &str = "255.255.255.255";

/// Magic packet header (6 bytes of 0xFF)
const MAGIC_HEADER: [u8; 6] = [0xFF; 6];

/// Number of MAC repetitions in a magic packet
const MAC_REPETITIONS: usize = 16;

/// Magic packet size (6 header + 16*6 MAC repetitions = 102 bytes)
pub const MAGIC_PACKET_SIZE: usize = MAGIC_HEADER.len() + MAC_REPETITIONS * MAC_LEN;

/// Primitive that transmits a wake signal for a hardware address
#[async_trait::async_trait]
pub trait WakeSender: Send + Sync {
    /// Send a wake signal to `address`
    ///
    /// An address that cannot be parsed is reported as
    /// [`Error::InvalidAddress`]; any transmission failure as
    /// [`Error::Dispatch`].
    async fn send_wake(&self, address: &str) -> Result<()>;
}

/// Create a magic packet for Wake-on-LAN
pub fn create_magic_packet(mac: &[u8; MAC_LEN]) -> [u8; MAGIC_PACKET_SIZE] {
    let mut packet = [0u8; MAGIC_PACKET_SIZE];

    packet[..MAGIC_HEADER.len()].copy_from_slice(&MAGIC_HEADER);
    for chunk in packet[MAGIC_HEADER.len()..].chunks_exact_mut(MAC_LEN) {
        chunk.copy_from_slice(mac);
    }

    packet
}

/// UDP broadcast magic packet sender
#[derive(Debug, Clone)]
pub struct UdpWakeSender {
    broadcast: IpAddr,
    port: u16,
}

impl UdpWakeSender {
    /// Create a sender for the given broadcast address and port
    pub fn new(broadcast: &str, port: u16) -> Result<Self> {
        let broadcast = broadcast.trim().parse::<IpAddr>().map_err(|_| {
            Error::Validation(format!("Invalid broadcast address: '{}'", broadcast))
        })?;
        Ok(Self { broadcast, port })
    }

    /// Destination the packets are sent to
    #[must_use]
    pub fn destination(&self) -> (IpAddr, u16) {
        (self.broadcast, self.port)
    }
}

impl Default for UdpWakeSender {
    fn default() -> Self {
        Self {
            broadcast: IpAddr::from([255, 255, 255, 255]),
            port: DEFAULT_WOL_PORT,
        }
    }
}

#[async_trait::async_trait]
impl WakeSender for UdpWakeSender {
    async fn send_wake(&self, address: &str) -> Result<()> {
        let mac = parse_mac_address(address)
            .map_err(|_| Error::InvalidAddress(address.trim().to_string()))?;
        let packet = create_magic_packet(&mac);
        let destination = (self.broadcast, self.port);

        debug!(
            mac = %format_mac(&mac),
            destination = %format!("{}:{}", self.broadcast, self.port),
            "Sending WoL magic packet"
        );

        let bind_addr = if self.broadcast.is_ipv6() {
            "[::]:0"
        } else {
            "0.0.0.0:0"
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| Error::Dispatch(format!("Failed to create UDP socket: {}", e)))?;

        socket
            .set_broadcast(true)
            .map_err(|e| Error::Dispatch(format!("Failed to enable broadcast: {}", e)))?;

        socket
            .send_to(&packet, destination)
            .await
            .map_err(|e| Error::Dispatch(format!("Failed to send magic packet: {}", e)))?;

        info!(
            mac = %format_mac(&mac),
            destination = %format!("{}:{}", self.broadcast, self.port),
            "WoL magic packet sent"
        );
        Ok(())
    }
}

/// Result of a wake request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// The wake signal was sent to the resolved address
    Sent {
        /// Device name as requested
        name: String,
        /// Address the signal was sent to
        address: String,
    },
    /// The user has no device with this name
    NotFound {
        /// Device name as requested
        name: String,
    },
}

/// Resolves device names and hands addresses to a [`WakeSender`]
#[derive(Clone)]
pub struct WakeDispatcher {
    directory: Arc<DeviceDirectory>,
    sender: Arc<dyn WakeSender>,
}

impl WakeDispatcher {
    /// Create a dispatcher over `directory` using `sender`
    #[must_use]
    pub fn new(directory: Arc<DeviceDirectory>, sender: Arc<dyn WakeSender>) -> Self {
        Self { directory, sender }
    }

    /// Directory used for name resolution
    #[must_use]
    pub fn directory(&self) -> &Arc<DeviceDirectory> {
        &self.directory
    }

    /// Wake the device `name` registered by `user`
    ///
    /// Dispatch failures are returned to the caller and never touch the
    /// registry.
    pub async fn wake(&self, user: &str, name: &str) -> Result<WakeOutcome> {
        let Some(address) = self.directory.resolve(user, name).await else {
            debug!(user_id = %user, name = %name, "Wake requested for unknown device");
            return Ok(WakeOutcome::NotFound {
                name: name.to_string(),
            });
        };

        if let Err(e) = self.sender.send_wake(&address).await {
            warn!(user_id = %user, name = %name, error = %e, "Wake dispatch failed");
            return Err(e);
        }

        info!(user_id = %user, name = %name, mac = %address, "Wake signal sent");
        Ok(WakeOutcome::Sent {
            name: name.to_string(),
            address,
        })
    }
}
