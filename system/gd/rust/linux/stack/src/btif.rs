//! Primitive types shared by the profile modules.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::cast::FromPrimitive;
use std::fmt::{Debug, Display, Formatter, Result};

/// Service class UUID of the Hands-Free Audio Gateway.
pub const UUID_SERVCLASS_AG_HANDSFREE: u16 = 0x111F;

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, PartialOrd)]
#[repr(u32)]
pub enum BtStatus {
    Success = 0,
    Fail,
    NotReady,
    NoMemory,
    Busy,
    Done,
    Unsupported,
    ParmInvalid,
    Unhandled,
    AuthFailure,
    RemoteDeviceDown,
    AuthRejected,

    // Any statuses that couldn't be cleanly converted
    Unknown = 0xff,
}

impl From<u32> for BtStatus {
    fn from(item: u32) -> Self {
        BtStatus::from_u32(item).unwrap_or(BtStatus::Unknown)
    }
}

/// Represents a Bluetooth device address.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawAddress {
    pub address: [u8; 6],
}

impl RawAddress {
    /// The all-zero address, used for unassigned control blocks.
    pub const EMPTY: RawAddress = RawAddress { address: [0; 6] };

    pub fn new(address: [u8; 6]) -> Self {
        Self { address }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl Display for RawAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.address[0],
            self.address[1],
            self.address[2],
            self.address[3],
            self.address[4],
            self.address[5]
        )
    }
}

impl Debug for RawAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display() {
        let addr = RawAddress::new([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xff]);
        assert_eq!(addr.to_string(), "00:11:22:AA:BB:FF");
        assert_eq!(format!("{:?}", addr), "00:11:22:AA:BB:FF");
        assert!(!addr.is_empty());
        assert!(RawAddress::default().is_empty());
    }

    #[test]
    fn status_from_u32() {
        assert_eq!(BtStatus::from(4), BtStatus::Busy);
        assert_eq!(BtStatus::from(1000), BtStatus::Unknown);
    }
}
