//! # Printer Transport Layer
//!
//! The session talks to the printer through the [`Transport`] trait, which
//! mirrors the handful of BLE GATT primitives the protocol needs:
//!
//! - **discover**: one scan poll for a peripheral matching a [`Target`]
//! - **connect** / **disconnect**
//! - **subscribe**: notifications from [`NOTIFY_CHARACTERISTIC`]
//! - **write**: raw bytes to [`WRITE_CHARACTERISTIC`]
//!
//! Implementations wrap whatever BLE stack the application uses. The crate
//! ships two that need no radio:
//!
//! - [`file::FileTransport`]: appends every write to a file (offline dumps)
//! - [`mock::MockTransport`]: scripted peripheral for tests
//!
//! Transports do not retry. Failed writes and connects are returned to the
//! session, which returns them to the caller.

pub mod file;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;

pub use file::FileTransport;
pub use mock::MockTransport;

/// GATT characteristic the host writes commands to.
pub const WRITE_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0000AE01_0000_1000_8000_00805F9B34FB);

/// GATT characteristic the printer sends notifications on.
pub const NOTIFY_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0000AE02_0000_1000_8000_00805F9B34FB);

/// Stream of raw notification payloads.
pub type Notifications = mpsc::UnboundedReceiver<Vec<u8>>;

/// Opaque peripheral handle returned by discovery.
pub type PeripheralId = String;

/// Which printer to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Target {
    /// Bluetooth MAC address (or platform UUID on macOS)
    Address(String),
    /// Advertised local name, e.g. `GB01`
    Name(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Address(addr) => write!(f, "address {}", addr),
            Target::Name(name) => write!(f, "name {}", name),
        }
    }
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Whether `id` is a platform peripheral UUID, as CoreBluetooth reports
/// instead of a MAC address.
pub fn is_platform_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// BLE primitives used by a print session.
#[async_trait]
pub trait Transport: Send {
    /// Run one discovery poll. `Ok(None)` means not seen yet.
    async fn discover(&mut self, target: &Target) -> Result<Option<PeripheralId>>;

    async fn connect(&mut self, peripheral: &PeripheralId) -> Result<()>;

    /// Subscribe to notifications on `characteristic`.
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<Notifications>;

    /// Write one transfer unit. Resolves once the write is acknowledged.
    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_ids() {
        assert_eq!(
            WRITE_CHARACTERISTIC.to_string(),
            "0000ae01-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            NOTIFY_CHARACTERISTIC.to_string(),
            "0000ae02-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_valid_mac_addresses() {
        assert!(is_valid_mac("00:11:22:33:44:55"));
        assert!(is_valid_mac("AA:BB:CC:DD:EE:FF"));
        assert!(is_valid_mac("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_invalid_mac_addresses() {
        assert!(!is_valid_mac("00:11:22:33:44")); // too short
        assert!(!is_valid_mac("00:11:22:33:44:55:66")); // too long
        assert!(!is_valid_mac("00-11-22-33-44-55")); // wrong separator
        assert!(!is_valid_mac("GG:HH:II:JJ:KK:LL")); // invalid hex
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_platform_ids() {
        assert!(is_platform_id("6F1C2A3B-0D4E-4F50-8A6B-7C8D9E0F1A2B"));
        assert!(!is_platform_id("00:11:22:33:44:55"));
        assert!(!is_platform_id("GB01"));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            Target::Address("00:11:22:33:44:55".into()).to_string(),
            "address 00:11:22:33:44:55"
        );
        assert_eq!(Target::Name("GB01".into()).to_string(), "name GB01");
    }
}
