//! Detector geometry collaborator
//!
//! The store needs the full channel list to seed default statuses, and the
//! classifier needs each channel's category (view) to pick its RMS cut.
//! Everything else about the detector is somebody else's problem.

use alloc::vec::Vec;
use core::ops::Range;

use crate::status::ChannelId;

/// Channel grouping used to index per-category thresholds
pub type Category = usize;

/// Channel map of the detector
pub trait ChannelGeometry {
    /// Total number of readout channels; ids run `0..channel_count()`
    fn channel_count(&self) -> u32;

    /// Category of `channel`, or `None` for an id outside the detector
    fn category_of(&self, channel: ChannelId) -> Option<Category>;

    /// Every channel id
    fn channels(&self) -> Range<ChannelId> {
        0..self.channel_count()
    }
}

/// Geometry of consecutive planes, each plane its own category
///
/// ```rust
/// use changuard_core::{ChannelGeometry, PlaneGeometry};
///
/// // two induction planes of 4 wires, one collection plane of 8
/// let geometry = PlaneGeometry::new(&[4, 4, 8]);
/// assert_eq!(geometry.channel_count(), 16);
/// assert_eq!(geometry.category_of(9), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneGeometry {
    /// Exclusive upper channel id of each plane
    plane_ends: Vec<ChannelId>,
}

impl PlaneGeometry {
    /// Build from the channel count of each plane, in readout order
    pub fn new(channels_per_plane: &[u32]) -> Self {
        let mut end: ChannelId = 0;
        let plane_ends = channels_per_plane
            .iter()
            .map(|count| {
                end = end.saturating_add(*count);
                end
            })
            .collect();
        Self { plane_ends }
    }

    /// Number of planes (categories)
    pub fn plane_count(&self) -> usize {
        self.plane_ends.len()
    }
}

impl ChannelGeometry for PlaneGeometry {
    fn channel_count(&self) -> u32 {
        self.plane_ends.last().copied().unwrap_or(0)
    }

    fn category_of(&self, channel: ChannelId) -> Option<Category> {
        // first plane whose end lies beyond the channel
        let plane = self.plane_ends.partition_point(|end| *end <= channel);
        (plane < self.plane_ends.len()).then_some(plane)
    }
}
