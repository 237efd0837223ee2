//! Reassembly of readings split over several advertisements.
//!
//! Some devices spread their metrics over alternating adverts. The buffer
//! merges each new reading over the last one seen for the same MAC and only
//! releases the merged record once an advert adds no new metric names, so a
//! published record always carries the full set.

use crate::mac_address::MacAddress;
use crate::reading::Reading;
use std::collections::{BTreeSet, HashMap};

/// Per-MAC merge buffer. Owned by the caller of the parser; single writer.
#[derive(Debug, Default)]
pub struct ReadingBuffer {
    readings: HashMap<MacAddress, Reading>,
}

impl ReadingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `reading` into the buffer; return the merged record when it is
    /// complete.
    ///
    /// The first reading of a MAC is never returned.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        let Some(buffered) = self.readings.get_mut(&reading.mac) else {
            self.readings.insert(reading.mac, reading);
            return None;
        };

        let before: BTreeSet<String> = buffered.metrics.keys().cloned().collect();

        buffered.rssi = reading.rssi;
        buffered.firmware = reading.firmware;
        buffered.device_type = reading.device_type;
        buffered.packet = reading.packet;
        buffered.metrics.extend(reading.metrics);
        buffered.data = !buffered.metrics.is_empty();

        buffered
            .metrics
            .keys()
            .eq(before.iter())
            .then(|| buffered.clone())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
