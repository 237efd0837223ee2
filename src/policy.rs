//! Whitelist/discovery admission policy.

use crate::mac_address::MacAddress;
use crate::reading::Category;
use std::collections::HashSet;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject,
}

/// Decides which devices have their data surfaced.
///
/// With discovery on every device is admitted; otherwise only addresses in the
/// whitelist of the reading's category.
#[derive(Debug, Clone)]
pub struct Policy {
    discovery: bool,
    sensors: HashSet<MacAddress>,
    trackers: HashSet<MacAddress>,
}

impl Default for Policy {
    fn default() -> Self {
        Self::discovery()
    }
}

impl Policy {
    /// Admit everything.
    pub fn discovery() -> Self {
        Self {
            discovery: true,
            sensors: HashSet::new(),
            trackers: HashSet::new(),
        }
    }

    pub fn new(
        discovery: bool,
        sensors: impl IntoIterator<Item = MacAddress>,
        trackers: impl IntoIterator<Item = MacAddress>,
    ) -> Self {
        Self {
            discovery,
            sensors: sensors.into_iter().collect(),
            trackers: trackers.into_iter().collect(),
        }
    }

    pub fn is_discovery(&self) -> bool {
        self.discovery
    }

    pub fn admit(&self, address: &MacAddress, category: Category) -> Admission {
        if self.discovery {
            return Admission::Admit;
        }

        let whitelist = match category {
            Category::Sensor => &self.sensors,
            Category::Tracker => &self.trackers,
        };

        if whitelist.contains(address) {
            Admission::Admit
        } else {
            Admission::Reject
        }
    }
}
