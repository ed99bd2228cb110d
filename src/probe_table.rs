use alloc::boxed::Box;
use alloc::vec;
use core::fmt::Debug;

/// Slot value marking an empty slot.
///
/// A zero key can still be a member of a [`UintSet`](crate::UintSet); the set
/// tracks it out of band because it can never be written into a slot.
pub const FREE_KEY: u64 = 0;

/// 32-bit golden ratio, widened to 64 bits, used to scramble keys.
const INT_PHI: u64 = 0x9E37_79B9;

/// Scrambles `key` so that runs of sequential ids spread across the table.
#[inline(always)]
pub(crate) fn phi_mix(key: u64) -> u64 {
    let h = key.wrapping_mul(INT_PHI);
    h ^ (h >> 16)
}

/// Outcome of walking the probe chain of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key is stored at this index.
    Found(usize),
    /// The chain ended at this empty index without meeting the key.
    Vacant(usize),
}

/// Flat array of `u64` slots resolved by linear probing.
///
/// The table only stores keys and walks chains. Sizing, the load threshold,
/// and the zero key are the owning set's business. Callers must keep at
/// least one slot free so every probe chain terminates.
#[derive(Clone)]
pub(crate) struct ProbeTable {
    slots: Box<[u64]>,
    mask: usize,
}

impl Debug for ProbeTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::vec::Vec;

        f.debug_struct("ProbeTable")
            .field("slots", &self.slots.len())
            .field(
                "layout",
                &self
                    .slots
                    .chunks(8)
                    .map(|row| {
                        row.iter()
                            .map(|&k| {
                                if k == FREE_KEY {
                                    String::from("....")
                                } else {
                                    format!("{:04x}", self.home_slot(k) & 0xffff)
                                }
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProbeTable {
    /// Allocates `slot_count` empty slots.
    ///
    /// `slot_count` must be a power of two no smaller than 2.
    pub(crate) fn with_slots(slot_count: usize) -> Self {
        debug_assert!(slot_count >= 2 && slot_count.is_power_of_two());
        Self {
            slots: vec![FREE_KEY; slot_count].into_boxed_slice(),
            mask: slot_count - 1,
        }
    }

    #[inline(always)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub(crate) fn slots(&self) -> &[u64] {
        &self.slots
    }

    pub(crate) fn into_slots(self) -> Box<[u64]> {
        self.slots
    }

    #[inline(always)]
    pub(crate) fn home_slot(&self, key: u64) -> usize {
        phi_mix(key) as usize & self.mask
    }

    #[inline(always)]
    fn next(&self, index: usize) -> usize {
        (index + 1) & self.mask
    }

    /// Walks the chain starting at the home slot of `key` until it meets
    /// either `key` or an empty slot.
    ///
    /// `key` must not be [`FREE_KEY`].
    #[inline]
    pub(crate) fn probe(&self, key: u64) -> Probe {
        debug_assert_ne!(key, FREE_KEY);
        let mut index = self.home_slot(key);
        loop {
            let stored = self.slots[index];
            if stored == key {
                return Probe::Found(index);
            }
            if stored == FREE_KEY {
                return Probe::Vacant(index);
            }
            index = self.next(index);
        }
    }

    #[inline]
    pub(crate) fn find(&self, key: u64) -> Option<usize> {
        match self.probe(key) {
            Probe::Found(index) => Some(index),
            Probe::Vacant(_) => None,
        }
    }

    /// Stores `key` at an index previously returned as [`Probe::Vacant`].
    #[inline(always)]
    pub(crate) fn write(&mut self, index: usize, key: u64) {
        debug_assert_eq!(self.slots[index], FREE_KEY);
        self.slots[index] = key;
    }

    /// Places a key known to be absent at the first free slot of its chain.
    pub(crate) fn insert_unique(&mut self, key: u64) {
        debug_assert_ne!(key, FREE_KEY);
        let mut index = self.home_slot(key);
        while self.slots[index] != FREE_KEY {
            debug_assert_ne!(self.slots[index], key);
            index = self.next(index);
        }
        self.slots[index] = key;
    }

    /// Removes the key stored at `index`, pulling later members of the chain
    /// back so that no lookup stops early at the vacated slot.
    ///
    /// A key at `candidate` may move into `last` unless its home slot lies in
    /// the circular interval `(last, candidate]`; moving such a key would put
    /// it in front of its own home slot, where probes never look.
    pub(crate) fn remove_at(&mut self, index: usize) {
        debug_assert_ne!(self.slots[index], FREE_KEY);
        let mut last = index;
        let mut candidate = self.next(last);
        loop {
            let key = self.slots[candidate];
            if key == FREE_KEY {
                self.slots[last] = FREE_KEY;
                return;
            }

            let home = self.home_slot(key);
            let movable = if last <= candidate {
                home <= last || home > candidate
            } else {
                home <= last && home > candidate
            };

            if movable {
                self.slots[last] = key;
                last = candidate;
            }
            candidate = self.next(candidate);
        }
    }

    /// Distance, in slots, between `index` and the home slot of the key
    /// stored there.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn displacement(&self, index: usize) -> usize {
        index.wrapping_sub(self.home_slot(self.slots[index])) & self.mask
    }

    pub(crate) fn clear(&mut self) {
        self.slots.fill(FREE_KEY);
    }

    /// Stored keys in physical slot order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots.iter().copied().filter(|&k| k != FREE_KEY)
    }
}
