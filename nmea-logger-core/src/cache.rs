//! Latest known static data per vessel

use std::collections::HashMap;

use crate::record::{DecodedPacket, StaticData, StructuredRecord, VesselId};

/// Map from vessel id to the most recently observed static data.
///
/// Each new static data message for a vessel replaces the previous entry
/// wholesale, blank fields included.
#[derive(Debug, Clone, Default)]
pub struct StaticDataCache {
    entries: HashMap<VesselId, StaticData>,
}

impl StaticDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record static data; other packet kinds are ignored
    pub fn observe(&mut self, record: &StructuredRecord) {
        if let DecodedPacket::StaticData(data) = &record.packet {
            self.entries.insert(data.user_id, data.clone());
        }
    }

    pub fn lookup(&self, vessel: VesselId) -> Option<&StaticData> {
        self.entries.get(&vessel)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
