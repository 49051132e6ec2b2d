//! Ordered status snapshot
//!
//! A [`StatusTable`] holds at most one [`StatusRecord`] per channel, ordered by
//! channel id, together with the [`ValidityInterval`] of the data it was built
//! from. Inserting a record for a channel that already has one replaces it.

use alloc::collections::{btree_map, BTreeMap, BTreeSet};

use crate::status::{ChannelId, Status, StatusRecord};
use crate::time::ValidityInterval;

/// One coherent snapshot of channel statuses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTable {
    rows: BTreeMap<ChannelId, StatusRecord>,
    interval: ValidityInterval,
}

impl StatusTable {
    /// Empty table with an empty interval
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table valid over `interval`
    pub fn with_interval(interval: ValidityInterval) -> Self {
        Self {
            rows: BTreeMap::new(),
            interval,
        }
    }

    /// Table assigning `status` to every channel in `channels`
    pub fn uniform<I>(channels: I, status: Status) -> Self
    where
        I: IntoIterator<Item = ChannelId>,
    {
        channels
            .into_iter()
            .map(|channel| StatusRecord::new(channel, status))
            .collect()
    }

    /// Insert a record, replacing any existing record for the same channel
    pub fn add_or_replace(&mut self, record: StatusRecord) -> Option<StatusRecord> {
        self.rows.insert(record.channel, record)
    }

    /// Record for `channel`, if any
    pub fn get(&self, channel: ChannelId) -> Option<&StatusRecord> {
        self.rows.get(&channel)
    }

    /// Status for `channel`, if any
    pub fn status(&self, channel: ChannelId) -> Option<Status> {
        self.get(channel).map(|record| record.status)
    }

    /// Whether `channel` has a record
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.rows.contains_key(&channel)
    }

    /// Remove every record; the interval is left as is
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no records are held
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Interval over which this snapshot is valid
    pub fn interval(&self) -> ValidityInterval {
        self.interval
    }

    /// Replace the validity interval
    pub fn set_interval(&mut self, interval: ValidityInterval) {
        self.interval = interval;
    }

    /// Records in ascending channel order
    pub fn iter(&self) -> btree_map::Values<'_, ChannelId, StatusRecord> {
        self.rows.values()
    }

    /// Channels whose record carries `status`
    pub fn channels_with_status(&self, status: Status) -> BTreeSet<ChannelId> {
        self.rows
            .values()
            .filter(|record| record.status == status)
            .map(|record| record.channel)
            .collect()
    }
}

impl FromIterator<StatusRecord> for StatusTable {
    fn from_iter<I: IntoIterator<Item = StatusRecord>>(iter: I) -> Self {
        let mut table = StatusTable::new();
        for record in iter {
            table.add_or_replace(record);
        }
        table
    }
}

impl Extend<StatusRecord> for StatusTable {
    fn extend<I: IntoIterator<Item = StatusRecord>>(&mut self, iter: I) {
        for record in iter {
            self.add_or_replace(record);
        }
    }
}

impl<'a> IntoIterator for &'a StatusTable {
    type Item = &'a StatusRecord;
    type IntoIter = btree_map::Values<'a, ChannelId, StatusRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
