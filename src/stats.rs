use alloc::vec::Vec;

use crate::probe_table::FREE_KEY;
use crate::uint_set::UintSet;

/// Probe statistics for a [`UintSet`].
///
/// Requires the `stats` feature.
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of members, including `0`
    pub members: usize,
    /// Member count at which the set resizes
    pub capacity: usize,
    /// Length of the slot array
    pub total_slots: usize,
    /// Number of slots holding a key
    pub occupied_slots: usize,
    /// Load factor (members / capacity)
    pub load_factor: f64,
    /// Slot utilization (occupied_slots / total_slots)
    pub slot_utilization: f64,
    /// Longest distance between a key and its home slot
    pub max_displacement: usize,
    /// Mean distance between a key and its home slot
    pub mean_displacement: f64,
    /// Bytes held by the slot array
    pub total_bytes: usize,
}

impl DebugStats {
    /// Pretty-print the statistics to stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== UintSet Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.members,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slot Usage: {}/{} ({:.2}% utilization)",
            self.occupied_slots,
            self.total_slots,
            self.slot_utilization * 100.0
        );
        println!(
            "Displacement: max {}, mean {:.3}",
            self.max_displacement, self.mean_displacement
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

impl UintSet {
    /// Counts stored keys by their distance from their home slot.
    ///
    /// Index `d` of the result holds the number of keys found `d` slots past
    /// the slot their hash points to. The zero member is not stored in the
    /// array and is not counted. An empty array yields an empty histogram.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let set: UintSet = (1..=100).collect();
    /// let hist = set.probe_histogram();
    /// assert_eq!(hist.iter().sum::<usize>(), 100);
    /// ```
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = Vec::new();
        for (index, &key) in self.table.slots().iter().enumerate() {
            if key == FREE_KEY {
                continue;
            }
            let distance = self.table.displacement(index);
            if hist.len() <= distance {
                hist.resize(distance + 1, 0);
            }
            hist[distance] += 1;
        }
        hist
    }

    /// Returns occupancy and probe-length statistics.
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.probe_histogram();
        let occupied_slots: usize = hist.iter().sum();
        let total_distance: usize = hist.iter().enumerate().map(|(d, &n)| d * n).sum();
        let total_slots = self.slot_count();

        DebugStats {
            members: self.len(),
            capacity: self.capacity(),
            total_slots,
            occupied_slots,
            load_factor: if self.capacity() == 0 {
                0.0
            } else {
                self.len() as f64 / self.capacity() as f64
            },
            slot_utilization: occupied_slots as f64 / total_slots as f64,
            max_displacement: hist.len().saturating_sub(1),
            mean_displacement: if occupied_slots == 0 {
                0.0
            } else {
                total_distance as f64 / occupied_slots as f64
            },
            total_bytes: total_slots * core::mem::size_of::<u64>(),
        }
    }
}
