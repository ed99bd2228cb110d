use core::fmt::Debug;
use core::iter::FusedIterator;

use tracing::debug;

use crate::error::ConfigError;
use crate::probe_table::FREE_KEY;
use crate::probe_table::Probe;
use crate::probe_table::ProbeTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "density-ninety-seven")] {
        /// Fill factor used by [`UintSet::new`] and [`UintSet::with_capacity`].
        pub const DEFAULT_FILL_FACTOR: f64 = 0.97;
    } else if #[cfg(feature = "density-ninety-two")] {
        /// Fill factor used by [`UintSet::new`] and [`UintSet::with_capacity`].
        pub const DEFAULT_FILL_FACTOR: f64 = 0.92;
    } else if #[cfg(feature = "density-eighty-seven-point-five")] {
        /// Fill factor used by [`UintSet::new`] and [`UintSet::with_capacity`].
        pub const DEFAULT_FILL_FACTOR: f64 = 0.875;
    } else {
        /// Fill factor used by [`UintSet::new`] and [`UintSet::with_capacity`].
        pub const DEFAULT_FILL_FACTOR: f64 = 0.80;
    }
}

/// Size hint used by [`UintSet::new`].
pub const DEFAULT_SIZE_HINT: usize = 8;

#[inline(always)]
fn threshold_for(slot_count: usize, fill_factor: f64) -> usize {
    // Truncation is floor for non-negative values.
    (slot_count as f64 * fill_factor) as usize
}

/// Smallest power-of-two slot count, at least 2, whose threshold admits
/// `members` at `fill_factor`.
fn slots_for(members: usize, fill_factor: f64) -> Option<usize> {
    let wanted = members as f64 / fill_factor;
    if !(wanted < usize::MAX as f64) {
        return None;
    }

    let mut wanted_slots = wanted as usize;
    if (wanted_slots as f64) < wanted {
        wanted_slots += 1;
    }

    let mut slot_count = wanted_slots.max(2).checked_next_power_of_two()?;
    while threshold_for(slot_count, fill_factor) < members {
        slot_count = slot_count.checked_mul(2)?;
    }
    Some(slot_count)
}

/// A set of `u64` values stored in one flat array with linear probing.
///
/// Keys are scrambled with a golden-ratio multiply and placed at the first
/// free slot of their chain. Removal compacts the chain in place instead of
/// leaving tombstones, so lookups stay fast no matter how many deletes the
/// set has seen. The array doubles whenever the member count reaches the
/// threshold derived from the configured fill factor; it never shrinks on its
/// own, see [`UintSet::shrink_to_fit`].
///
/// The value `0` doubles as the empty-slot marker and is tracked with a
/// separate flag, so every `u64` can be a member.
///
/// # Performance Characteristics
///
/// - **Memory**: 8 bytes per slot, `1 / fill_factor` slots per member.
/// - **Lookups**: one multiply and a short forward scan of contiguous memory.
///
/// # Concurrency
///
/// `UintSet` has no internal synchronization. Iterators borrow the set, so
/// mutating it while one is alive is rejected at compile time; sharing it
/// across threads requires an external lock.
#[derive(Clone)]
pub struct UintSet {
    pub(crate) table: ProbeTable,
    fill_factor: f64,
    threshold: usize,
    len: usize,
    has_free_key: bool,
}

impl PartialEq for UintSet {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl Eq for UintSet {}

impl Debug for UintSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Default for UintSet {
    fn default() -> Self {
        Self::new()
    }
}

impl UintSet {
    /// Creates an empty set sized for [`DEFAULT_SIZE_HINT`] members at
    /// [`DEFAULT_FILL_FACTOR`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let set = UintSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SIZE_HINT)
    }

    /// Creates an empty set that holds at least `size` members before its
    /// first resize, using [`DEFAULT_FILL_FACTOR`].
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or the required slot count overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let set = UintSet::with_capacity(100);
    /// assert!(set.capacity() >= 100);
    /// ```
    pub fn with_capacity(size: usize) -> Self {
        Self::with_capacity_and_fill_factor(size, DEFAULT_FILL_FACTOR)
    }

    /// Creates an empty set for `size` expected members that resizes once
    /// `fill_factor` of its slots are taken.
    ///
    /// The slot count is the smallest power of two no smaller than
    /// `size / fill_factor`, and at least 2.
    ///
    /// # Panics
    ///
    /// Panics if `fill_factor` is not strictly between 0 and 1, if `size` is
    /// zero, or if the slot count overflows `usize`. Use
    /// [`UintSet::try_with_capacity_and_fill_factor`] to get these as errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let set = UintSet::with_capacity_and_fill_factor(10, 0.99);
    /// assert_eq!(set.slot_count(), 16);
    /// assert_eq!(set.capacity(), 15);
    /// ```
    pub fn with_capacity_and_fill_factor(size: usize, fill_factor: f64) -> Self {
        match Self::try_with_capacity_and_fill_factor(size, fill_factor) {
            Ok(set) => set,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`UintSet::with_capacity_and_fill_factor`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::ConfigError;
    /// use uintset::UintSet;
    ///
    /// assert!(UintSet::try_with_capacity_and_fill_factor(10, 0.5).is_ok());
    /// assert_eq!(
    ///     UintSet::try_with_capacity_and_fill_factor(10, 1.0),
    ///     Err(ConfigError::InvalidFillFactor(1.0))
    /// );
    /// assert_eq!(
    ///     UintSet::try_with_capacity_and_fill_factor(0, 0.5),
    ///     Err(ConfigError::InvalidSizeHint)
    /// );
    /// ```
    pub fn try_with_capacity_and_fill_factor(
        size: usize,
        fill_factor: f64,
    ) -> Result<Self, ConfigError> {
        if !(fill_factor > 0.0 && fill_factor < 1.0) {
            return Err(ConfigError::InvalidFillFactor(fill_factor));
        }
        if size == 0 {
            return Err(ConfigError::InvalidSizeHint);
        }

        let slot_count = slots_for(size, fill_factor).ok_or(ConfigError::CapacityOverflow)?;
        Ok(Self {
            table: ProbeTable::with_slots(slot_count),
            fill_factor,
            threshold: threshold_for(slot_count, fill_factor),
            len: 0,
            has_free_key: false,
        })
    }

    /// Returns the number of members, counting `0` if it is one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns how many members the set holds before its next resize.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let set = UintSet::with_capacity_and_fill_factor(100, 0.5);
    /// assert_eq!(set.slot_count(), 256);
    /// assert_eq!(set.capacity(), 128);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        self.threshold
    }

    /// Returns the length of the backing slot array.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    /// Returns the fill factor the set was created with.
    #[inline]
    pub fn fill_factor(&self) -> f64 {
        self.fill_factor
    }

    /// Returns `true` if `key` is a member.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// set.insert(4);
    /// assert!(set.contains(4));
    /// assert!(!set.contains(5));
    /// ```
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        if key == FREE_KEY {
            return self.has_free_key;
        }
        self.table.find(key).is_some()
    }

    /// Adds `key` to the set.
    ///
    /// Returns `true` if it was not already a member. Inserting a new key
    /// when the member count has reached [`UintSet::capacity`] doubles the
    /// slot array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// assert!(set.insert(37));
    /// assert!(!set.insert(37));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, key: u64) -> bool {
        if key == FREE_KEY {
            if self.has_free_key {
                return false;
            }
            self.has_free_key = true;
            self.len += 1;
            return true;
        }

        match self.table.probe(key) {
            Probe::Found(_) => false,
            Probe::Vacant(index) => {
                self.table.write(index, key);
                if self.len >= self.threshold {
                    self.grow();
                } else {
                    self.len += 1;
                }
                true
            }
        }
    }

    /// Removes `key` from the set.
    ///
    /// Returns `true` if it was a member. Removing an absent key, `0`
    /// included, leaves the set untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// set.insert(1);
    /// assert!(set.remove(1));
    /// assert!(!set.remove(1));
    /// assert!(!set.remove(0));
    /// assert_eq!(set.len(), 0);
    /// ```
    pub fn remove(&mut self, key: u64) -> bool {
        if key == FREE_KEY {
            if !self.has_free_key {
                return false;
            }
            self.has_free_key = false;
            self.len -= 1;
            return true;
        }

        match self.table.find(key) {
            Some(index) => {
                self.table.remove_at(index);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Removes every member. The slot array keeps its size.
    pub fn clear(&mut self) {
        self.table.clear();
        self.len = 0;
        self.has_free_key = false;
    }

    /// Grows the slot array, if needed, so that `additional` more members fit
    /// without a resize.
    ///
    /// # Panics
    ///
    /// Panics if the new slot count overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// set.reserve(1000);
    /// assert!(set.capacity() >= 1000);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let wanted = self.len.checked_add(additional).expect("capacity overflow");
        if wanted <= self.threshold {
            return;
        }

        let slot_count = slots_for(wanted, self.fill_factor).expect("capacity overflow");
        debug!(additional, slot_count, "reserving uintset slots");
        self.rebuild(slot_count);
    }

    /// Shrinks the slot array to the smallest size that holds the current
    /// members at the configured fill factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::with_capacity_and_fill_factor(1000, 0.5);
    /// set.insert(1);
    /// set.insert(2);
    /// set.shrink_to_fit();
    /// assert_eq!(set.slot_count(), 4);
    /// assert!(set.contains(1) && set.contains(2));
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let slot_count = slots_for(self.len.max(1), self.fill_factor)
            .expect("capacity overflow");
        if slot_count < self.table.slot_count() {
            debug!(slot_count, len = self.len, "shrinking uintset");
            self.rebuild(slot_count);
        }
    }

    /// Keeps only the members for which `f` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set: UintSet = (0..8).collect();
    /// set.retain(|&k| k % 2 == 0);
    /// assert_eq!(set.len(), 4);
    /// assert!(set.contains(0) && set.contains(6));
    /// assert!(!set.contains(3));
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&u64) -> bool) {
        if self.has_free_key && !f(&FREE_KEY) {
            self.has_free_key = false;
        }

        // Survivors are reinserted into a fresh array of the same size.
        let slot_count = self.table.slot_count();
        let old = core::mem::replace(&mut self.table, ProbeTable::with_slots(slot_count));
        let mut populated = 0;
        for key in old.keys() {
            if f(&key) {
                self.table.insert_unique(key);
                populated += 1;
            }
        }

        let before = self.len;
        self.len = populated + usize::from(self.has_free_key);
        debug!(before, after = self.len, "retained uintset members");
    }

    /// Returns an iterator over the members.
    ///
    /// `0` comes first if it is a member; the rest follow in slot order,
    /// which is neither insertion nor numeric order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let mut set = UintSet::new();
    /// set.insert(3);
    /// set.insert(0);
    ///
    /// let mut members: Vec<u64> = set.iter().collect();
    /// assert_eq!(members[0], 0);
    /// members.sort();
    /// assert_eq!(members, [0, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            free_key: self.has_free_key,
            slots: self.table.slots().iter(),
            remaining: self.len,
        }
    }

    /// Returns `true` if `self` and `other` share no members.
    pub fn is_disjoint(&self, other: &UintSet) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if every member of `self` is also in `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let a: UintSet = [1, 2].into_iter().collect();
    /// let b: UintSet = [1, 2, 3].into_iter().collect();
    /// assert!(a.is_subset(&b));
    /// assert!(b.is_superset(&a));
    /// ```
    pub fn is_subset(&self, other: &UintSet) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every member of `other` is also in `self`.
    pub fn is_superset(&self, other: &UintSet) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over members of either set, each yielded once.
    pub fn union<'a>(&'a self, other: &'a UintSet) -> Union<'a> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            first: self,
        }
    }

    /// Returns an iterator over members present in both sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uintset::UintSet;
    ///
    /// let a: UintSet = [1, 2, 3].into_iter().collect();
    /// let b: UintSet = [2, 3, 4].into_iter().collect();
    ///
    /// let mut both: Vec<u64> = a.intersection(&b).collect();
    /// both.sort();
    /// assert_eq!(both, [2, 3]);
    /// ```
    pub fn intersection<'a>(&'a self, other: &'a UintSet) -> Intersection<'a> {
        if self.len() <= other.len() {
            Intersection {
                iter: self.iter(),
                other,
            }
        } else {
            Intersection {
                iter: other.iter(),
                other: self,
            }
        }
    }

    /// Returns an iterator over members of `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a UintSet) -> Difference<'a> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over members in exactly one of the two sets.
    pub fn symmetric_difference<'a>(&'a self, other: &'a UintSet) -> SymmetricDifference<'a> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let slot_count = self
            .table
            .slot_count()
            .checked_mul(2)
            .expect("capacity overflow");
        debug!(
            old_slots = self.table.slot_count(),
            new_slots = slot_count,
            "growing uintset"
        );
        self.rebuild(slot_count);
    }

    /// Moves every stored key into a fresh array of `slot_count` slots and
    /// recomputes the threshold and member count.
    fn rebuild(&mut self, slot_count: usize) {
        let old = core::mem::replace(&mut self.table, ProbeTable::with_slots(slot_count));
        self.threshold = threshold_for(slot_count, self.fill_factor);

        let mut populated = 0;
        for key in old.keys() {
            self.table.insert_unique(key);
            populated += 1;
        }
        debug_assert!(populated <= self.threshold, "rebuilt table over threshold");

        self.len = populated + usize::from(self.has_free_key);
    }
}

/// An iterator over the members of a [`UintSet`].
///
/// Created by [`UintSet::iter`].
#[derive(Clone)]
pub struct Iter<'a> {
    free_key: bool,
    slots: core::slice::Iter<'a, u64>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.free_key {
            self.free_key = false;
            self.remaining -= 1;
            return Some(FREE_KEY);
        }

        for &key in self.slots.by_ref() {
            if key != FREE_KEY {
                self.remaining -= 1;
                return Some(key);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// A consuming iterator over the members of a [`UintSet`].
pub struct IntoIter {
    free_key: bool,
    slots: alloc::vec::IntoIter<u64>,
    remaining: usize,
}

impl Iterator for IntoIter {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.free_key {
            self.free_key = false;
            self.remaining -= 1;
            return Some(FREE_KEY);
        }

        for key in self.slots.by_ref() {
            if key != FREE_KEY {
                self.remaining -= 1;
                return Some(key);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IntoIter {}

impl FusedIterator for IntoIter {}

impl IntoIterator for UintSet {
    type IntoIter = IntoIter;
    type Item = u64;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            free_key: self.has_free_key,
            remaining: self.len,
            slots: self.table.into_slots().into_vec().into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a UintSet {
    type IntoIter = Iter<'a>;
    type Item = u64;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<u64> for UintSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut set = UintSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<u64> for UintSet {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            self.reserve(lower);
        }
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a> Extend<&'a u64> for UintSet {
    fn extend<I: IntoIterator<Item = &'a u64>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// An iterator over the union of two sets.
pub struct Union<'a> {
    iter: Iter<'a>,
    other_iter: Iter<'a>,
    first: &'a UintSet,
}

impl Iterator for Union<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.first.contains(v) {
                return Some(v);
            }
        }
    }
}

impl FusedIterator for Union<'_> {}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a> {
    iter: Iter<'a>,
    other: &'a UintSet,
}

impl Iterator for Intersection<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

impl FusedIterator for Intersection<'_> {}

/// An iterator over the difference of two sets.
pub struct Difference<'a> {
    iter: Iter<'a>,
    other: &'a UintSet,
}

impl Iterator for Difference<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

impl FusedIterator for Difference<'_> {}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<'a> {
    iter: core::iter::Chain<Difference<'a>, Difference<'a>>,
}

impl Iterator for SymmetricDifference<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

impl FusedIterator for SymmetricDifference<'_> {}
