mod probe;

use std::fmt;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::map::Stats;

use self::probe::Probe;

/// The default (and minimum) number of slots in a table.
pub const MIN_CAPACITY: usize = 40;

/// The hard upper bound on the number of slots in a table.
pub const MAX_CAPACITY: usize = 65535;

// The state of a slot.
//
// Slots transition `Empty -> Used` on insert, `Used -> Deleted` on removal,
// and `Deleted -> Used` when a tombstone is reused. They never transition
// back to `Empty` outside of a resize, which rebuilds the array from
// scratch.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Empty,
    Used,
    Deleted,
}

// One storage cell of the table.
struct Slot<V> {
    state: SlotState,
    key: Key,
    value: Option<V>,
}

impl<V> Slot<V> {
    fn empty() -> Slot<V> {
        Slot {
            state: SlotState::Empty,
            key: Key::unset(),
            value: None,
        }
    }
}

// The outcome of probing for a key.
enum ProbeOutcome {
    // A used slot holding the key.
    Found(usize),
    // An open slot where the key can be placed.
    Vacant(usize),
    // Every slot is used or deleted; there is no gap to terminate the scan.
    Exhausted,
}

// Scans for `key` starting at its home slot.
//
// An empty slot terminates the scan: the key is absent, and the insertion
// point is that slot (or the first tombstone seen along the way, when
// `reuse_tombstones` is set). Tombstones keep probe chains alive, so the
// scan continues through them either way.
//
// A free function rather than a method so that a resize can probe the new
// slot array while the old one is still in place.
fn probe_slots<V>(slots: &[Slot<V>], key: &Key, reuse_tombstones: bool) -> ProbeOutcome {
    let mut tombstone = None;
    let mut probe = Probe::start(key, slots.len());

    while !probe.exhausted() {
        let slot = &slots[probe.i];

        match slot.state {
            SlotState::Empty => return ProbeOutcome::Vacant(tombstone.unwrap_or(probe.i)),

            SlotState::Used if slot.key == *key => return ProbeOutcome::Found(probe.i),

            SlotState::Deleted => {
                if reuse_tombstones && tombstone.is_none() {
                    tombstone = Some(probe.i);
                }
            }

            SlotState::Used => {}
        }

        probe.next();
    }

    ProbeOutcome::Exhausted
}

// A fixed-key open-addressing hash table.
//
// `count` tracks the number of slots claimed since the last resize, not the
// number of live entries: deletions do not decrement it, which skews the
// shrink trigger accordingly.
pub(crate) struct RawTable<V> {
    slots: Vec<Slot<V>>,
    count: usize,
}

impl<V> RawTable<V> {
    // Allocates an all-empty slot array of exactly `capacity` slots.
    //
    // Allocation is fallible; the caller decides whether the failure is
    // fatal (construction) or recoverable (resize).
    pub fn with_capacity(capacity: usize) -> Result<RawTable<V>> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, Slot::empty);

        Ok(RawTable { slots, count: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn key(&self, i: usize) -> &Key {
        &self.slots[i].key
    }

    pub fn value(&self, i: usize) -> Option<&V> {
        self.slots[i].value.as_ref()
    }

    pub fn value_mut(&mut self, i: usize) -> Option<&mut V> {
        self.slots[i].value.as_mut()
    }

    pub fn value_slot_mut(&mut self, i: usize) -> &mut Option<V> {
        &mut self.slots[i].value
    }

    // Returns the index of the used slot holding `key`.
    pub fn find(&self, key: &Key) -> Option<usize> {
        match probe_slots(&self.slots, key, false) {
            ProbeOutcome::Found(i) => Some(i),
            _ => None,
        }
    }

    // Claims a slot for `key`, reusing the first tombstone on the key's
    // probe chain when the key is absent.
    //
    // Returns the slot index and whether the key was already present. A new
    // claim leaves the value unset and increments `count`; the growth check
    // is the caller's responsibility.
    pub fn insert_key(&mut self, key: Key) -> Result<(usize, bool)> {
        match probe_slots(&self.slots, &key, true) {
            ProbeOutcome::Found(i) => Ok((i, true)),

            ProbeOutcome::Vacant(i) => {
                let slot = &mut self.slots[i];
                slot.state = SlotState::Used;
                slot.key = key;
                slot.value = None;
                self.count += 1;

                Ok((i, false))
            }

            ProbeOutcome::Exhausted => Err(Error::TableExhausted),
        }
    }

    // Tombstones the slot holding `key`, handing its value back.
    //
    // The outer `Option` distinguishes "no such key" from a claimed slot
    // whose value was never populated. `count` is intentionally left
    // untouched; see the type-level comment.
    pub fn remove(&mut self, key: &Key) -> Option<Option<V>> {
        let i = self.find(key)?;

        let slot = &mut self.slots[i];
        slot.state = SlotState::Deleted;
        slot.key.clear();

        Some(slot.value.take())
    }

    // Returns the index of the first used slot at or after `cursor`.
    pub fn next_used(&self, cursor: usize) -> Option<usize> {
        self.slots
            .get(cursor..)?
            .iter()
            .position(|slot| slot.state == SlotState::Used)
            .map(|offset| cursor + offset)
    }

    // Grow when more than 80% of the slots have been claimed.
    pub fn should_grow(&self) -> bool {
        self.count > 4 * self.capacity() / 5
    }

    pub fn grow_target(&self) -> usize {
        if self.capacity() < MAX_CAPACITY / 2 {
            2 * self.capacity()
        } else {
            MAX_CAPACITY
        }
    }

    // Shrink when fewer than 10% of the slots have been claimed.
    pub fn should_shrink(&self) -> bool {
        self.count < self.capacity() / 10
    }

    pub fn shrink_target(&self) -> usize {
        self.capacity() / 2
    }

    // Rehashes every live entry into a freshly sized slot array.
    //
    // The target is clamped to `[MIN_CAPACITY, MAX_CAPACITY]`, and a clamped
    // target equal to the current capacity is a no-op. Tombstones are
    // dropped by the migration and `count` resets to the number of live
    // entries.
    //
    // The swap is all-or-nothing: keys (which are `Copy`) are placed into
    // the new array before any value moves, so a failure at any point
    // leaves the original table untouched.
    pub fn resize(&mut self, target: usize) -> Result<()> {
        let target = target.clamp(MIN_CAPACITY, MAX_CAPACITY);
        if target == self.capacity() {
            return Ok(());
        }

        log::debug!("resizing table from {} to {}", self.capacity(), target);

        let mut new = RawTable::with_capacity(target)?;

        // Phase one: place the keys. Live keys are unique, so each lands in
        // a vacant slot; exhaustion of the new array aborts cleanly here.
        let mut cursor = 0;
        while let Some(i) = self.next_used(cursor) {
            new.insert_key(self.slots[i].key)?;
            cursor = i + 1;
        }

        // Phase two: move the values across. Every key was placed above, so
        // the lookup cannot miss.
        let mut cursor = 0;
        while let Some(i) = self.next_used(cursor) {
            if let Some(j) = new.find(&self.slots[i].key) {
                new.slots[j].value = self.slots[i].value.take();
            }

            cursor = i + 1;
        }

        self.slots = new.slots;
        self.count = new.count;

        Ok(())
    }

    // Computes clustering statistics in one linear pass.
    //
    // A run is a maximal contiguous block of used or deleted slots. The
    // scan never wraps around the array boundary (unlike probing), and the
    // trailing run is flushed unconditionally, even when empty, so
    // `min_run` is 0 whenever the final slot is empty.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            deleted: 0,
            max_run: 0,
            min_run: self.capacity(),
        };
        let mut run = 0;

        for slot in &self.slots {
            match slot.state {
                SlotState::Empty => {
                    if run > 0 {
                        stats.max_run = stats.max_run.max(run);
                        stats.min_run = stats.min_run.min(run);
                        run = 0;
                    }
                }

                SlotState::Used => run += 1,

                SlotState::Deleted => {
                    run += 1;
                    stats.deleted += 1;
                }
            }
        }

        stats.max_run = stats.max_run.max(run);
        stats.min_run = stats.min_run.min(run);

        stats
    }
}

impl<V: fmt::Debug> RawTable<V> {
    // Renders the per-slot dump behind `Table::dump`.
    pub fn write_dump(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "size: {}, filled: {} ({:.2}%)",
            self.capacity(),
            self.count,
            100.0 * self.count as f64 / self.capacity() as f64
        )?;

        for (i, slot) in self.slots.iter().enumerate() {
            match slot.state {
                SlotState::Empty => {}
                SlotState::Used => writeln!(f, "{i:3}: {} : {:?}", slot.key, slot.value)?,
                SlotState::Deleted => writeln!(f, "{i:3}: deleted")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn keys(n: usize) -> Vec<Key> {
        (0..n).map(|i| Key::new(format!("k{i}"))).collect()
    }

    #[test]
    fn insert_then_find() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        let (i, existing) = table.insert_key(Key::new("bob")).unwrap();
        assert!(!existing);
        assert_eq!(table.count(), 1);

        *table.value_slot_mut(i) = Some(7);

        let j = table.find(&Key::new("bob")).unwrap();
        assert_eq!(i, j);
        assert_eq!(table.value(j), Some(&7));
        assert_eq!(table.find(&Key::new("dave")), None);
    }

    #[test]
    fn reinsert_is_an_update() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        let (i, _) = table.insert_key(Key::new("bob")).unwrap();
        *table.value_slot_mut(i) = Some(7);

        let (j, existing) = table.insert_key(Key::new("bob")).unwrap();
        assert!(existing);
        assert_eq!(i, j);
        // The update path must not disturb the stored value or the count.
        assert_eq!(table.value(j), Some(&7));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn tombstone_is_reused() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        let (i, _) = table.insert_key(Key::new("bob")).unwrap();
        assert_eq!(table.remove(&Key::new("bob")), Some(None));

        // The tombstone sits at the key's home slot, so re-inserting the
        // key claims the same index instead of extending the chain.
        let (j, existing) = table.insert_key(Key::new("bob")).unwrap();
        assert!(!existing);
        assert_eq!(i, j);
        assert_eq!(table.stats().deleted, 0);
    }

    #[test]
    fn remove_absent_is_a_no_op() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        assert_eq!(table.remove(&Key::new("bob")), None);
        assert_eq!(table.remove(&Key::new("bob")), None);
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn count_survives_deletion() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        for key in keys(10) {
            table.insert_key(key).unwrap();
        }
        assert_eq!(table.count(), 10);

        for key in keys(10) {
            table.remove(&key);
        }

        // `count` tracks slots claimed since the last resize.
        assert_eq!(table.count(), 10);
        assert_eq!(table.stats().deleted, 10);
    }

    #[test]
    fn probe_exhaustion_is_surfaced() {
        let mut table: RawTable<u32> = RawTable::with_capacity(4).unwrap();

        for key in keys(4) {
            table.insert_key(key).unwrap();
        }

        match table.insert_key(Key::new("overflow")) {
            Err(Error::TableExhausted) => {}
            other => panic!("expected exhaustion, got {:?}", other.map(|_| ())),
        }

        // A lookup on a gapless table terminates after `capacity` slots.
        assert_eq!(table.find(&Key::new("missing")), None);
    }

    #[test]
    fn resize_rehashes_live_entries() {
        let mut table: RawTable<usize> = RawTable::with_capacity(40).unwrap();

        for (n, key) in keys(20).into_iter().enumerate() {
            let (i, _) = table.insert_key(key).unwrap();
            *table.value_slot_mut(i) = Some(n);
        }
        for key in keys(5) {
            table.remove(&key);
        }

        table.resize(160).unwrap();

        assert_eq!(table.capacity(), 160);
        // Tombstones are compacted away and `count` resets to live entries.
        assert_eq!(table.count(), 15);
        assert_eq!(table.stats().deleted, 0);

        for (n, key) in keys(20).into_iter().enumerate() {
            if n < 5 {
                assert_eq!(table.find(&key), None);
            } else {
                let i = table.find(&key).unwrap();
                assert_eq!(table.value(i), Some(&n));
            }
        }
    }

    #[test]
    fn resize_clamps_and_ignores_no_ops() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        table.resize(1).unwrap();
        assert_eq!(table.capacity(), MIN_CAPACITY);

        table.resize(MAX_CAPACITY + 1).unwrap();
        assert_eq!(table.capacity(), MAX_CAPACITY);
    }

    #[test]
    fn failed_resize_leaves_the_table_untouched() {
        // 41 live entries cannot fit in 40 slots, so the migration's first
        // phase exhausts the new array.
        let mut table: RawTable<usize> = RawTable::with_capacity(41).unwrap();

        for (n, key) in keys(41).into_iter().enumerate() {
            let (i, _) = table.insert_key(key).unwrap();
            *table.value_slot_mut(i) = Some(n);
        }

        match table.resize(40) {
            Err(Error::TableExhausted) => {}
            other => panic!("expected exhaustion, got {:?}", other.map(|_| ())),
        }

        assert_eq!(table.capacity(), 41);
        assert_eq!(table.count(), 41);
        for (n, key) in keys(41).into_iter().enumerate() {
            let i = table.find(&key).unwrap();
            assert_eq!(table.value(i), Some(&n));
        }
    }

    #[test]
    fn next_used_walks_live_slots_in_order() {
        let mut table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        let mut indices = Vec::new();
        for key in keys(8) {
            let (i, _) = table.insert_key(key).unwrap();
            indices.push(i);
        }
        indices.sort_unstable();

        let mut walked = Vec::new();
        let mut cursor = 0;
        while let Some(i) = table.next_used(cursor) {
            walked.push(i);
            cursor = i + 1;
        }

        assert_eq!(walked, indices);
        assert_eq!(table.next_used(table.capacity()), None);
        assert_eq!(table.next_used(table.capacity() + 10), None);
    }

    #[test]
    fn stats_on_a_synthetic_layout() {
        let mut table: RawTable<u32> = RawTable::with_capacity(8).unwrap();

        // Layout: U U E D E E U U, with runs of 2, 1 and a trailing 2.
        for i in [0, 1, 6, 7] {
            table.slots[i].state = SlotState::Used;
        }
        table.slots[3].state = SlotState::Deleted;

        let stats = table.stats();
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.max_run, 2);
        assert_eq!(stats.min_run, 1);
    }

    #[test]
    fn stats_trailing_empty_slot_zeroes_min_run() {
        let mut table: RawTable<u32> = RawTable::with_capacity(8).unwrap();

        // Layout: U U E E E E E E, where the trailing flush sees a zero run.
        table.slots[0].state = SlotState::Used;
        table.slots[1].state = SlotState::Used;

        let stats = table.stats();
        assert_eq!(stats.max_run, 2);
        assert_eq!(stats.min_run, 0);
    }

    #[test]
    fn stats_on_an_empty_table() {
        let table: RawTable<u32> = RawTable::with_capacity(40).unwrap();

        assert_eq!(
            table.stats(),
            Stats {
                deleted: 0,
                max_run: 0,
                min_run: 0
            }
        );
    }
}
