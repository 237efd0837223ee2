//! Duplicate advertisement suppression.
//!
//! Devices repeat each advertisement several times with the same packet id.
//! The filter remembers the last packet id per MAC and drops repeats.
//! Readings without a packet id are never considered duplicates.

use crate::mac_address::MacAddress;
use crate::reading::{PacketId, Reading};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct DuplicateFilter {
    last_packet: HashMap<MacAddress, u32>,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reading` and report whether it repeats the previous packet.
    pub fn is_duplicate(&mut self, reading: &Reading) -> bool {
        let PacketId::Id(packet) = reading.packet else {
            return false;
        };
        self.last_packet.insert(reading.mac, packet) == Some(packet)
    }
}
